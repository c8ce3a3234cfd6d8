use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;

use trackline::cli::{CliArgs, OutputFormat, ReplaySource};
use trackline::config::InteractionConfig;
use trackline::keymap::{load_default_keymap, Platform};
use trackline::replay::{ReplayEvent, Replayer};

fn main() -> Result<()> {
    trackline::tracing::init();

    let config = InteractionConfig::load();
    let settings = CliArgs::parse().into_settings(&config);

    if let Some(config) = &settings.save {
        let path = config.save()?;
        println!("Saved config to {}", path.display());
        return Ok(());
    }

    let platform = Platform::install(settings.platform);
    let keymap = load_default_keymap(platform, settings.keymap.as_deref());
    tracing::info!(
        ?platform,
        shortcuts = keymap.len(),
        "keymap loaded"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if settings.list {
        for (command, keys) in keymap.cheat_sheet() {
            writeln!(out, "{:<12} {}", keys, command)?;
        }
        return Ok(());
    }

    let script = match &settings.source {
        ReplaySource::Script(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?,
        ReplaySource::Inline(keys) => keys.clone(),
        ReplaySource::None => {
            std::io::read_to_string(std::io::stdin()).context("failed to read script from stdin")?
        }
    };

    let mut replayer = Replayer::new(&keymap, settings.timeout)?;
    replayer.set_key_gap(settings.gap);
    replayer.run(&script)?;

    match settings.format {
        OutputFormat::Json => {
            for event in replayer.events() {
                writeln!(out, "{}", serde_json::to_string(&event)?)?;
            }
        }
        OutputFormat::Text => {
            for event in replayer.events() {
                writeln!(out, "{}", describe(&event))?;
            }
            if let Some(pending) = replayer.pending_chord() {
                writeln!(out, "pending  {}", pending)?;
            }
        }
    }

    Ok(())
}

fn describe(event: &ReplayEvent) -> String {
    match event {
        ReplayEvent::Key {
            at_ms,
            key,
            outcome,
        } => format!("{:>6}ms {:<10} {:?}", at_ms, key, outcome),
        ReplayEvent::ModalShown { modal } => format!("  open   {}", modal),
        ReplayEvent::ModalClosed { modal } => format!("  close  {}", modal),
        ReplayEvent::Navigated { route } => format!("  goto   {}", route),
        ReplayEvent::ShortcutHelp { visible } => {
            format!("  help   {}", if *visible { "shown" } else { "hidden" })
        }
    }
}
