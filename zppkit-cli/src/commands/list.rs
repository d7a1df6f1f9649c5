use std::path::Path;

use anyhow::Context;

use zppkit::formats::bank::{RoleRecord, SoundBank};

pub fn execute(source: &Path, detailed: bool, json: bool) -> anyhow::Result<()> {
    let bank = SoundBank::open(source)
        .with_context(|| format!("failed to parse {}", source.display()))?;
    let summary = bank.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if let Some(name) = &summary.project_name {
        println!("Project: {name}");
    }
    if let Some(scheme) = summary.scheme {
        println!("Engine scheme: {scheme}");
    }
    println!(
        "{} clips across {} directory entries, {} roles",
        summary.clip_count,
        bank.clips.index_count(),
        summary.role_count
    );
    println!();
    println!("{:>5} {:>8} {:>9} {:>4} {:>8}  {}", "index", "offset", "bytes", "bits", "rate", "name");

    for clip in &summary.clips {
        let name = clip.name.as_deref().unwrap_or("-");
        let offset = format!("{:#x}", clip.offset);
        println!(
            "{:>5} {:>8} {:>9} {:>4} {:>8}  {} ({})",
            clip.index, offset, clip.bytes, clip.bits, clip.sample_rate_hz, name, clip.kind,
        );
        if detailed {
            for role in &clip.roles {
                println!("        role: {}", describe_role(role));
            }
        }
    }
    Ok(())
}

fn describe_role(role: &RoleRecord) -> String {
    match role {
        RoleRecord::Function(f) => {
            format!("function F{} vol {}%{}", f.function_id, f.volume, if f.looped { " looped" } else { "" })
        }
        RoleRecord::Special(s) => format!("special '{}' vol {}%", s.kind.label(), s.volume),
        RoleRecord::Periodic(p) => format!(
            "periodic slot {} every {}-{}s for {}s",
            p.slot, p.min_delay_s, p.max_delay_s, p.duration_s
        ),
        RoleRecord::TapChange(t) => format!("tap-changer step {}", t.step),
        RoleRecord::Engine(e) => format!(
            "engine {} from speed {}% (period {} ms)",
            e.stage.as_str(),
            e.speed,
            e.period_ms
        ),
    }
}
