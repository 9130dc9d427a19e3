use crate::usecase::navigator::NavView;
use std::fmt::Write as _;

/// Where human-readable output goes. Stderr when stdout carries NDJSON events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanOut {
    Stdout,
    Stderr,
}

impl HumanOut {
    pub fn for_events(emit_events: bool) -> Self {
        if emit_events {
            HumanOut::Stderr
        } else {
            HumanOut::Stdout
        }
    }

    pub fn line(self, text: &str) {
        match self {
            HumanOut::Stdout => println!("{text}"),
            HumanOut::Stderr => eprintln!("{text}"),
        }
    }
}

/// Plain-text rendering of the popup: breadcrumb, folder choices, URL count.
pub fn render_view(view: &NavView, emphasize: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.breadcrumb.to_terminal(emphasize));

    if view.folders.is_empty() {
        out.push_str("  (no sub-folders)\n");
    } else {
        for folder in &view.folders {
            let title: String = folder.title.chars().filter(|c| !c.is_control()).collect();
            let _ = writeln!(out, "  [{}] {title}", folder.id);
        }
    }

    let _ = write!(
        out,
        "urls: {}  sample size: {}",
        view.url_count, view.sample_size
    );
    out
}
