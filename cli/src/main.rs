mod atomic_write;
mod canvas;
mod config;
mod logging;

use anyhow::Context;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use textlabel_protocol::AnchorPoint;
use textlabel_protocol::Outcome;
use textlabel_protocol::SessionConfig;
use textlabel_tui::OverlayHost;
use textlabel_tui::prompt_label;
use textlabel_tui::tui;
use textlabel_tui::tui::Tui;

use crate::config::ConfigKey;
use crate::config::ConfigStore;
use crate::config::LabelDefaults;

#[derive(Parser, Debug)]
#[command(version, about = "Edit text labels in place on the terminal")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Edit a single label and print how the session ended as JSON.
    Edit(EditArgs),
    /// Place and revise labels on a scrollable canvas.
    Canvas {
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Change the persisted label defaults.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Set `stroke_color`, `font` or `opacity` in `~/.textlabel/config.toml`.
    Set { key: ConfigKey, value: String },
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Anchor column; defaults to the middle of the screen.
    #[arg(long)]
    x: Option<u16>,

    /// Anchor row; defaults to the middle of the screen.
    #[arg(long)]
    y: Option<u16>,

    /// Text of the label being revised. Leave empty to create a new label.
    #[arg(long, default_value = "")]
    init_text: String,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// Label color: a name like `red`, `#rrggbb`, or a palette index.
    #[arg(long, env = "TEXTLABEL_STROKE_COLOR")]
    stroke_color: Option<String>,

    #[arg(long, env = "TEXTLABEL_FONT")]
    font: Option<String>,

    /// Percentage from 0 to 100.
    #[arg(long, env = "TEXTLABEL_OPACITY", value_parser = clap::value_parser!(u8).range(0..=100))]
    opacity: Option<u8>,
}

impl StyleArgs {
    fn apply(self, defaults: LabelDefaults) -> LabelDefaults {
        LabelDefaults {
            stroke_color: self.stroke_color.unwrap_or(defaults.stroke_color),
            font: self.font.unwrap_or(defaults.font),
            opacity: self.opacity.unwrap_or(defaults.opacity),
        }
    }
}

/// Owns the terminal while a UI is up and restores it on drop, whichever way the UI exits.
struct TerminalSession {
    tui: Tui,
}

impl TerminalSession {
    fn start() -> anyhow::Result<Self> {
        let mut terminal = tui::init().context("initialize terminal")?;
        terminal.clear()?;
        Ok(Self {
            tui: Tui::new(terminal),
        })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        // Stop reading stdin before handing the terminal back to the shell.
        self.tui.pause_events();
        let _ = tui::restore();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let store = ConfigStore::new_default()?;
    if let Some(dir) = store.dir() {
        logging::init(dir);
    }

    match cli.command {
        CliCommand::Edit(args) => {
            let defaults = load_defaults(&store);
            let outcome = run_edit(args, defaults).await?;
            println!("{}", serde_json::to_string(&outcome)?);
        }
        CliCommand::Canvas { style } => {
            let defaults = style.apply(load_defaults(&store));
            let labels = {
                let mut session = TerminalSession::start()?;
                canvas::run_canvas(&mut session.tui, defaults).await?
            };
            for label in labels {
                println!("{}", serde_json::to_string(&label)?);
            }
        }
        CliCommand::Config {
            action: ConfigCommand::Set { key, value },
        } => {
            store
                .set(key, &value)
                .with_context(|| format!("set `{}`", key.as_str()))?;
        }
    }
    Ok(())
}

fn load_defaults(store: &ConfigStore) -> LabelDefaults {
    store.label_defaults().unwrap_or_else(|err| {
        tracing::warn!("failed to read config, using built-in defaults: {err:#}");
        LabelDefaults::default()
    })
}

async fn run_edit(args: EditArgs, defaults: LabelDefaults) -> anyhow::Result<Outcome> {
    let mut session = TerminalSession::start()?;
    let screen = session.tui.area()?;
    let style = args.style.apply(defaults);
    let config = SessionConfig {
        init_text: args.init_text,
        anchor: AnchorPoint::new(
            args.x.unwrap_or(screen.width / 2),
            args.y.unwrap_or(screen.height / 2),
        ),
        stroke_color: style.stroke_color,
        font: style.font,
        opacity: style.opacity,
    };
    let host = OverlayHost::new();
    prompt_label(&mut session.tui, &host, config, &()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn edit_args_override_defaults() {
        let cli = Cli::try_parse_from([
            "textlabel",
            "edit",
            "--x",
            "12",
            "--init-text",
            "hello",
            "--opacity",
            "40",
        ])
        .expect("parse");
        let CliCommand::Edit(args) = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(args.x, Some(12));
        assert_eq!(args.y, None);
        assert_eq!(args.init_text, "hello");
        assert_eq!(
            args.style.apply(LabelDefaults::default()),
            LabelDefaults {
                opacity: 40,
                ..LabelDefaults::default()
            }
        );
    }

    #[test]
    fn opacity_above_one_hundred_is_rejected() {
        assert!(Cli::try_parse_from(["textlabel", "edit", "--opacity", "101"]).is_err());
    }

    #[test]
    fn config_set_takes_snake_case_keys() {
        let cli = Cli::try_parse_from(["textlabel", "config", "set", "stroke_color", "#ff0000"])
            .expect("parse");
        let CliCommand::Config {
            action: ConfigCommand::Set { key, value },
        } = cli.command
        else {
            panic!("expected config set");
        };
        assert_eq!(key, ConfigKey::StrokeColor);
        assert_eq!(value, "#ff0000");
    }
}
