use crate::usecase::event::NavEvent;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn nav_event_to_json(ev: &NavEvent) -> serde_json::Value {
    serde_json::to_value(ev)
        .unwrap_or_else(|e| json!({"type": "unserializable_event", "error": e.to_string()}))
}

pub fn spawn_ndjson_printer(mut rx: mpsc::Receiver<NavEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let line = nav_event_to_json(&ev);

            // NDJSON to stdout.
            println!("{line}");
        }
    })
}
