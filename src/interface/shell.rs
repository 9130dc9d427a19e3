//! Interactive session: one long-lived "popup" on a single event loop.
//!
//! User commands, bookmark file changes and store notifications are handled
//! one at a time in arrival order. State lives in the background keeper and is
//! written through to the state file on every change.

use crate::domain::model::SampleSize;
use crate::domain::traits::{BookmarkStore, StateChannel, UniformSource, UrlOpener};
use crate::infrastructure::bookmark_tree::BookmarkTree;
use crate::infrastructure::event_ndjson::spawn_ndjson_printer;
use crate::infrastructure::file_watcher::BookmarksWatcher;
use crate::infrastructure::rng::RandSource;
use crate::infrastructure::serde_json_adapter::read_bookmarks_file;
use crate::infrastructure::state_channel::spawn_state_keeper;
use crate::infrastructure::state_file::StateFile;
use crate::infrastructure::url_opener::{PrintOpener, SystemOpener};
use crate::interface::render::{render_view, HumanOut};
use crate::usecase::event::NavEvent;
use crate::usecase::navigator::Navigator;
use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ShellOptions {
    pub bookmarks_path: PathBuf,
    pub state_path: PathBuf,
    pub open_urls: bool,
    pub emit_events: bool,
    pub watch_poll: Duration,
}

enum Flow {
    Continue,
    Quit,
}

pub async fn run_shell<I>(input: I, opts: ShellOptions) -> Result<()>
where
    I: AsyncBufRead + Unpin,
{
    let out = HumanOut::for_events(opts.emit_events);

    let (tx, rx) = mpsc::channel::<NavEvent>(1024);
    let printer = if opts.emit_events {
        Some(spawn_ndjson_printer(rx))
    } else {
        drop(rx);
        None
    };

    let state_file = StateFile::new(&opts.state_path);
    let initial = state_file.read().await?;
    let (client, keeper) = spawn_state_keeper(initial, Some(state_file));

    let dto = read_bookmarks_file(&opts.bookmarks_path)
        .await
        .with_context(|| format!("reading bookmarks: {}", opts.bookmarks_path.display()))?;
    let mut tree = BookmarkTree::from_dto(&dto);
    let mut store_events = tree.subscribe();

    let mut nav = Navigator::restore(tree, client.clone(), Some(tx)).await?;

    let emphasize = out == HumanOut::Stdout && std::io::stdout().is_terminal();
    out.line(&render_view(&nav.view(), emphasize));
    nav.on_change(move |view| out.line(&render_view(view, emphasize)));

    let mut watcher = match BookmarksWatcher::new(&opts.bookmarks_path, opts.watch_poll) {
        Ok(w) => Some(w),
        Err(err) => {
            let error = format!("{err:#}");
            warn!(%error, "bookmarks file will not be watched");
            None
        }
    };

    let opener: Box<dyn UrlOpener> = if opts.open_urls {
        Box::new(SystemOpener)
    } else {
        Box::new(PrintOpener {
            to_stderr: opts.emit_events,
        })
    };
    let mut rng = RandSource::thread();
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading command")? else {
                    break;
                };
                match handle_line(&mut nav, &line, &mut rng, opener.as_ref(), out, emphasize).await {
                    Flow::Continue => {}
                    Flow::Quit => break,
                }
            }
            Some(()) = next_change(&mut watcher) => {
                match read_bookmarks_file(&opts.bookmarks_path).await {
                    Ok(dto) => nav.store_mut().import(&dto),
                    Err(err) => {
                        let error = format!("{err:#}");
                        warn!(%error, "keeping previous bookmarks");
                    }
                }
            }
            Some(event) = store_events.recv() => {
                nav.handle_store_event(event).await;
            }
        }
    }

    drop(nav);
    drop(client);
    keeper.await.ok();
    if let Some(handle) = printer {
        handle.await.ok();
    }
    Ok(())
}

async fn next_change(watcher: &mut Option<BookmarksWatcher>) -> Option<()> {
    match watcher {
        Some(w) => w.changed().await,
        None => std::future::pending().await,
    }
}

async fn handle_line<S, C, R>(
    nav: &mut Navigator<S, C>,
    line: &str,
    rng: &mut R,
    opener: &dyn UrlOpener,
    out: HumanOut,
    emphasize: bool,
) -> Flow
where
    S: BookmarkStore,
    C: StateChannel,
    R: UniformSource + ?Sized,
{
    let line = line.trim();
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };

    let outcome: Result<()> = match (cmd, arg) {
        ("", _) => Ok(()),
        ("quit" | "exit", _) => return Flow::Quit,
        ("help" | "?", _) => {
            out.line(SHELL_HELP);
            Ok(())
        }
        ("ls" | "show", _) => {
            out.line(&render_view(&nav.view(), emphasize));
            Ok(())
        }
        ("up", _) | ("cd", "..") => nav.ascend().await.map_err(Into::into),
        ("cd" | "down", "") => Err(anyhow::anyhow!("usage: cd <folder id or name>")),
        ("cd" | "down", sel) => nav.descend_by(sel).await.map_err(Into::into),
        ("root", _) => {
            nav.reset().await;
            Ok(())
        }
        ("size", n) => match SampleSize::parse(n) {
            Ok(size) => {
                nav.set_sample_size(size).await;
                out.line(&format!("sample size: {size}"));
                Ok(())
            }
            Err(err) => Err(err.into()),
        },
        ("sample", _) => nav.open_sample(rng, opener).await.map(|picked| {
            out.line(&format!(
                "sampled {} of {} urls",
                picked.len(),
                nav.urls().len()
            ));
        }),
        (other, _) => Err(anyhow::anyhow!("unknown command: {other} (try help)")),
    };

    if let Err(err) = outcome {
        eprintln!("warning: {err:#}");
    }
    Flow::Continue
}

const SHELL_HELP: &str = "commands:\n  ls               show the current folder\n  cd <id|name>     descend into a sub-folder\n  cd .. | up       go up one level\n  root             go back to the root\n  size <1-50>      set how many URLs to sample\n  sample           open a random sample of this folder's URLs\n  quit";
