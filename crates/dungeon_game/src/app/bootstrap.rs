use std::path::Path;
use std::sync::Arc;

use room_engine::{
    register_standard_responses, DispatchTables, Layer, LayerError, SharedTables, SimConfig,
    StandardLayers, TileTable, TileTableError,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::demo::Demo;
use super::paths::{AppPaths, StartupError};

pub(crate) struct AppWiring {
    pub(crate) config: SimConfig,
    pub(crate) demo: Demo,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Room Sim Startup ===");

    let paths = AppPaths::resolve()?;
    let config = SimConfig::load_or_default(&paths.sim_config)?;
    let tiles = load_tile_table(&paths.tiles)?;
    let shared = build_shared_tables(tiles)?;
    info!(
        root = %paths.root.display(),
        target_tps = config.target_tps,
        max_ticks = config.max_ticks,
        tile_kinds = shared.tiles.len(),
        layer_pairs = shared.dispatch.registered_pairs(),
        "startup_config_loaded"
    );

    let demo = Demo::new(&config, shared);
    Ok(AppWiring { config, demo })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_tile_table(path: &Path) -> Result<TileTable, TileTableError> {
    if !path.is_file() {
        info!(path = %path.display(), "tile_table_default");
        return Ok(TileTable::standard());
    }
    TileTable::load(path)
}

pub(crate) fn standard_layers() -> Result<StandardLayers, LayerError> {
    Ok(StandardLayers {
        player: Layer::new(0)?,
        enemy: Layer::new(1)?,
        projectile: Layer::new(2)?,
        familiar: Layer::new(3)?,
        terrain: Layer::new(4)?,
        terrain_trigger: Layer::new(5)?,
        barrier: Layer::new(6)?,
    })
}

pub(crate) fn build_shared_tables(tiles: TileTable) -> Result<SharedTables, LayerError> {
    let layers = standard_layers()?;
    let mut builder = DispatchTables::builder();
    register_standard_responses(&mut builder, layers);
    Ok(SharedTables {
        dispatch: Arc::new(builder.build()),
        tiles: Arc::new(tiles),
        layers,
    })
}
