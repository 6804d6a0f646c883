use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use gpui::*;
use gpui_component::Root;
use kanban_board::{BoardStore, KanbanBoard, KanbanConfig, MemoryStore};
use tracing_subscriber::EnvFilter;

fn open_store(config: &KanbanConfig) -> anyhow::Result<Arc<dyn BoardStore>> {
    let store = match &config.data_path {
        Some(path) => MemoryStore::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?,
        None => MemoryStore::new(),
    }
    .with_latency(Duration::from_millis(config.store_latency_ms));

    if config.seed {
        store.seed().context("failed to seed the store")?;
    }
    Ok(Arc::new(store))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = KanbanConfig::load_or_default()?;
    let store = open_store(&config)?;
    tracing::info!(data = ?config.data_path, "starting kanban");

    let app = Application::new();

    app.run(move |cx| {
        gpui_component::init(cx);
        cx.activate(true);

        cx.spawn(async move |cx| {
            cx.open_window(
                WindowOptions {
                    titlebar: Some(TitlebarOptions {
                        title: Some("Kanban".into()),
                        appears_transparent: false,
                        traffic_light_position: None,
                    }),
                    ..Default::default()
                },
                |window, cx| {
                    let view = cx.new(|cx| KanbanBoard::new(store, config, window, cx));
                    cx.new(|cx| Root::new(view, window, cx))
                },
            )?;

            Ok::<_, anyhow::Error>(())
        })
        .detach();
    });

    Ok(())
}
