use crate::domain::model::SampleSize;
use crate::domain::traits::UrlOpener;
use crate::infrastructure::bookmark_tree::BookmarkTree;
use crate::infrastructure::config::Config;
use crate::infrastructure::event_ndjson::spawn_ndjson_printer;
use crate::infrastructure::rng::RandSource;
use crate::infrastructure::serde_json_adapter::read_bookmarks_file;
use crate::infrastructure::state_file::StateFile;
use crate::infrastructure::url_opener::{PrintOpener, SystemOpener};
use crate::interface::render::{render_view, HumanOut};
use crate::interface::shell::{run_shell, ShellOptions};
use crate::usecase::event::NavEvent;
use crate::usecase::navigator::Navigator;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

pub async fn run() -> Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    run_with_args(&args).await
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run_with_args(args: &[String]) -> Result<()> {
    let cli = Cli::parse(args)?;

    let config = Config::load(cli.common.config.as_deref())?;
    let bookmarks_path = config.resolve_bookmarks_path(cli.common.bookmarks.as_deref())?;
    let state_path = config.resolve_state_path(cli.common.state.as_deref())?;

    let command = match cli.mode {
        Mode::Once(command) => command,
        Mode::Shell => {
            let opts = ShellOptions {
                bookmarks_path,
                state_path,
                open_urls: config.open_urls,
                emit_events: cli.common.emit_events,
                watch_poll: Duration::from_millis(config.watch_poll_ms),
            };
            return run_shell(BufReader::new(tokio::io::stdin()), opts).await;
        }
    };

    let out = HumanOut::for_events(cli.common.emit_events);
    let (tx, rx) = mpsc::channel::<NavEvent>(1024);
    let printer = if cli.common.emit_events {
        Some(spawn_ndjson_printer(rx))
    } else {
        drop(rx);
        None
    };

    let dto = read_bookmarks_file(&bookmarks_path)
        .await
        .with_context(|| format!("reading bookmarks: {}", bookmarks_path.display()))?;
    let tree = BookmarkTree::from_dto(&dto);
    let mut nav = Navigator::restore(tree, StateFile::new(&state_path), Some(tx)).await?;

    let emphasize = out == HumanOut::Stdout && std::io::stdout().is_terminal();
    let result: Result<bool> = match command {
        Command::Show => Ok(true),
        Command::Down { selector } => nav.descend_by(&selector).await.map(|()| true).map_err(Into::into),
        Command::Up => nav.ascend().await.map(|()| true).map_err(Into::into),
        Command::Root => {
            nav.reset().await;
            Ok(true)
        }
        Command::Size { size } => {
            nav.set_sample_size(size).await;
            Ok(true)
        }
        Command::Sample {
            count,
            seed,
            print_only,
        } => {
            if let Some(size) = count {
                nav.set_sample_size(size).await;
            }

            let opener: Box<dyn UrlOpener> = if print_only || !config.open_urls {
                Box::new(PrintOpener {
                    to_stderr: cli.common.emit_events,
                })
            } else {
                Box::new(SystemOpener)
            };

            let picked = match seed {
                Some(seed) => {
                    nav.open_sample(&mut RandSource::seeded(seed), opener.as_ref())
                        .await
                }
                None => nav.open_sample(&mut RandSource::thread(), opener.as_ref()).await,
            };
            picked.map(|picked| {
                eprintln!(
                    "summary: sampled={} available={} folder={}",
                    picked.len(),
                    nav.urls().len(),
                    nav.breadcrumb()
                );
                false
            })
        }
    };

    if let Ok(true) = result {
        out.line(&render_view(&nav.view(), emphasize));
    }

    // Closing the sink lets the printer drain and stop.
    drop(nav);
    if let Some(handle) = printer {
        handle.await.ok();
    }

    result.map(|_| ())
}

#[derive(Debug)]
enum Command {
    Show,
    Down {
        selector: String,
    },
    Up,
    Root,
    Size {
        size: SampleSize,
    },
    Sample {
        count: Option<SampleSize>,
        seed: Option<u64>,
        print_only: bool,
    },
}

#[derive(Debug)]
enum Mode {
    Once(Command),
    Shell,
}

#[derive(Debug, Default)]
struct CommonArgs {
    bookmarks: Option<PathBuf>,
    state: Option<PathBuf>,
    config: Option<PathBuf>,
    emit_events: bool,
}

#[derive(Debug)]
struct Cli {
    mode: Mode,
    common: CommonArgs,
}

impl Cli {
    fn parse(args: &[String]) -> Result<Self> {
        // Expected:
        // <bin> <show|down|up|root|size|sample|shell> [positional] [flags]
        if args.len() < 2 {
            return Err(anyhow!(usage()));
        }

        let name = args[1].as_str();
        if !matches!(
            name,
            "show" | "down" | "up" | "root" | "size" | "sample" | "shell"
        ) {
            return Err(anyhow!(format!("unknown command: {name}\n\n{}", usage())));
        }

        let mut common = CommonArgs::default();
        let mut positional: Vec<String> = Vec::new();
        let mut count: Option<SampleSize> = None;
        let mut seed: Option<u64> = None;
        let mut print_only = false;

        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--in" | "--bookmarks" => {
                    common.bookmarks = Some(PathBuf::from(flag_value(args, &mut i)?));
                }
                "--state" => {
                    common.state = Some(PathBuf::from(flag_value(args, &mut i)?));
                }
                "--config" => {
                    common.config = Some(PathBuf::from(flag_value(args, &mut i)?));
                }
                "--emit-events" => {
                    common.emit_events = true;
                }
                "--count" if name == "sample" => {
                    count = Some(SampleSize::parse(flag_value(args, &mut i)?)?);
                }
                "--seed" if name == "sample" => {
                    let raw = flag_value(args, &mut i)?;
                    seed = Some(
                        raw.parse()
                            .map_err(|_| anyhow!(format!("--seed must be an integer: {raw}")))?,
                    );
                }
                "--print-only" if name == "sample" => {
                    print_only = true;
                }
                "-h" | "--help" => return Err(anyhow!(usage())),
                other if other.starts_with("--") => {
                    return Err(anyhow!(format!("unknown arg: {other}\n\n{}", usage())))
                }
                other => positional.push(other.to_string()),
            }
            i += 1;
        }

        let command = match name {
            "down" => {
                let selector = single_positional(positional, "down <folder id or name>")?;
                Command::Down { selector }
            }
            "size" => {
                let raw = single_positional(positional, "size <1-50>")?;
                Command::Size {
                    size: SampleSize::parse(&raw)?,
                }
            }
            _ if !positional.is_empty() => {
                return Err(anyhow!(format!(
                    "unexpected argument: {}\n\n{}",
                    positional[0],
                    usage()
                )))
            }
            "show" => Command::Show,
            "up" => Command::Up,
            "root" => Command::Root,
            "shell" => return Ok(Cli {
                mode: Mode::Shell,
                common,
            }),
            _ => Command::Sample {
                count,
                seed,
                print_only,
            },
        };

        Ok(Cli {
            mode: Mode::Once(command),
            common,
        })
    }
}

fn single_positional(mut positional: Vec<String>, form: &str) -> Result<String> {
    if positional.len() != 1 {
        return Err(anyhow!(format!("expected: {form}\n\n{}", usage())));
    }
    Ok(positional.remove(0))
}

/// The value following the flag at `args[*i]`; advances `i` onto it.
fn flag_value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!(format!("missing value for {flag}\n\n{}", usage())))
}

fn usage() -> &'static str {
    "Usage:\n  bookmark-sampler show   [common]\n  bookmark-sampler down   <folder id|name> [common]\n  bookmark-sampler up     [common]\n  bookmark-sampler root   [common]\n  bookmark-sampler size   <1-50> [common]\n  bookmark-sampler sample [--count <1-50>] [--seed <n>] [--print-only] [common]\n  bookmark-sampler shell  [common]\n\nCommon:\n  --bookmarks/--in <file>  browser Bookmarks file (default: config, then detected profile)\n  --state <file>           navigator state file\n  --config <file>          config TOML\n  --emit-events            NDJSON events on stdout; human output goes to stderr"
}
