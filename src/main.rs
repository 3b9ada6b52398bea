use std::fs;
use std::sync::Arc;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use hexworld::anchors::RuleBasedAnchors;
use hexworld::ascii::{self, AsciiMode};
use hexworld::content::{ContentGenerator, LlmConfig, LlmContent, ProceduralContent};
use hexworld::export;
use hexworld::schema::WorldSeed;
use hexworld::{GenerationParams, TagConfig, WorldAssembler};

#[derive(Parser, Debug)]
#[command(name = "hexworld")]
#[command(about = "Assemble a hex world from settlement clusters, connectors and filler")]
struct Args {
    /// World seed JSON (built-in demo seed if not specified)
    #[arg(long)]
    seed_file: Option<String>,

    /// Override the seed id (random if neither this nor a seed file is given)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the world radius
    #[arg(short, long)]
    radius: Option<i32>,

    /// Tag configuration TOML (built-in if not specified)
    #[arg(long)]
    tags: Option<String>,

    /// Generation parameters JSON
    #[arg(long)]
    params: Option<String>,

    /// Hex map output path
    #[arg(short, long, default_value = "world_map.json")]
    output: String,

    /// Also save the full world (connectors, anchors, stats) here
    #[arg(long)]
    world_output: Option<String>,

    /// Print an ASCII preview
    #[arg(long)]
    ascii: bool,

    /// Write a text report with maps and stats
    #[arg(long)]
    report: Option<String>,

    /// Write a PNG preview
    #[arg(long)]
    png: Option<String>,

    /// Pixels per hex in the PNG preview
    #[arg(long, default_value = "6")]
    png_cell: u32,

    /// OpenAI-compatible endpoint for hex content
    #[arg(long)]
    llm_url: Option<String>,

    /// Model name sent to the endpoint
    #[arg(long)]
    model: Option<String>,

    /// Use procedural content even when an endpoint is given
    #[arg(long)]
    offline: bool,
}

fn main() -> hexworld::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut seed = match &args.seed_file {
        Some(path) => {
            println!("Loading world seed from {}", path);
            serde_json::from_str::<WorldSeed>(&fs::read_to_string(path)?)?
        }
        None => WorldSeed::demo(args.seed.unwrap_or_else(rand::random)),
    };
    if let Some(id) = args.seed {
        seed.seed_id = id;
    }
    if let Some(radius) = args.radius {
        seed.world_radius = radius;
    }

    let config = Arc::new(match &args.tags {
        Some(path) => TagConfig::from_path(path)?,
        None => TagConfig::builtin()?,
    });
    let params: GenerationParams = match &args.params {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => GenerationParams::default(),
    };

    let content = content_generator(&args, &config, &params);
    let anchors = Box::new(RuleBasedAnchors::new(params.max_anchors_per_connector));

    println!("Assembling world with seed: {}", seed.seed_id);
    println!(
        "Radius {}: {} clusters, {} connectors, {} content",
        seed.world_radius,
        seed.clusters.len(),
        seed.connectors.len(),
        content.name()
    );

    let assembler = WorldAssembler::new(config, content, anchors, params);
    let world = assembler.assemble(&seed)?;
    let stats = &world.stats;

    println!("Clusters: {} ({} hexes)", stats.total_clusters, stats.cluster_hexes);
    println!("Connectors: {} ({} hexes, {} anchors)", stats.total_connectors, stats.connector_hexes, stats.total_anchors);
    println!("Filler: {} hexes", stats.filler_hexes);
    println!("Total: {} hexes in {} ms", stats.total_hexes, stats.generation_time_ms);
    for failure in &world.failures {
        println!("  skipped: {}", failure);
    }

    let report = export::validate_hex_map(&world.hex_map);
    if !report.is_valid() {
        warn!(
            missing = report.missing.len(),
            out_of_bounds = report.out_of_bounds.len(),
            edge_mismatches = report.edge_mismatches.len(),
            "hex map failed validation"
        );
    }

    export::save_hex_map(&world.hex_map, &args.output)?;
    println!("Saved hex map to {}", args.output);

    if let Some(path) = &args.world_output {
        export::save_world(&world, path)?;
        println!("Saved world to {}", path);
    }
    if let Some(path) = &args.report {
        ascii::export_world_file(&world, path)?;
        println!("Saved report to {}", path);
    }
    if let Some(path) = &args.png {
        ascii::export_hex_png(&world.hex_map, path, args.png_cell)?;
        println!("Saved preview to {}", path);
    }
    if args.ascii {
        print!("{}", ascii::render_ascii_map(&world.hex_map, AsciiMode::Terrain));
        print!("{}", ascii::terrain_legend());
    }

    Ok(())
}

/// LLM content when an endpoint answers, procedural otherwise
fn content_generator(args: &Args, config: &Arc<TagConfig>, params: &GenerationParams) -> Box<dyn ContentGenerator> {
    let procedural = || Box::new(ProceduralContent::new(config.clone())) as Box<dyn ContentGenerator>;

    let Some(url) = &args.llm_url else {
        return procedural();
    };
    if args.offline {
        return procedural();
    }

    let llm_config = LlmConfig {
        base_url: url.trim_end_matches('/').to_string(),
        model: args.model.clone(),
        retries: params.content_retries,
        backoff_ms: params.retry_backoff_ms,
        ..LlmConfig::default()
    };
    match LlmContent::new(llm_config) {
        Ok(llm) if llm.health_check() => Box::new(llm),
        Ok(_) => {
            println!("LLM server at {} not reachable, using procedural content", url);
            procedural()
        }
        Err(e) => {
            println!("Could not create LLM client ({}), using procedural content", e);
            procedural()
        }
    }
}
