use anyhow::{Context, Result};
use muv_seo_core::{ChangeFreq, RouteDescriptor};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "muv-seo.toml";
const ROUTES_FILE: &str = "routes.json";

const STARTER_CONFIG: &str = r#"# muv-seo configuration

[site]
base_url = "https://www.muvfitness.it"
name = "MUV Fitness"
language = "it"
default_og_image = "https://www.muvfitness.it/og-image.jpg"
# twitter_handle = "@muvfitness"
# telephone = "+39 0442 000000"

[paths]
routes = "routes.json"
output = "dist"
# Built index.html containing the <!-- Default SEO --> block
template = "dist/index.html"
# Offline post export; when unset SUPABASE_URL and SUPABASE_ANON_KEY are used
# posts_file = "posts.json"

[news]
window_hours = 48

[robots]
extra_disallow = []
extra_blocked_agents = []

# [indexnow]
# key = "your-indexnow-key"
"#;

fn route(
    path: &str,
    title: &str,
    description: &str,
    priority: f64,
    changefreq: ChangeFreq,
) -> RouteDescriptor {
    RouteDescriptor {
        path: path.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        keywords: None,
        priority,
        changefreq,
        lastmod: None,
        og_image: None,
    }
}

fn starter_routes() -> Vec<RouteDescriptor> {
    let mut home = route(
        "/",
        "MUV Fitness Legnago | Palestra, EMS e Personal Training",
        "Centro fitness a Legnago con allenamento EMS, personal training e pilates.",
        1.0,
        ChangeFreq::Daily,
    );
    home.keywords = Some("palestra legnago, ems legnago, personal trainer legnago".to_string());

    vec![
        home,
        route(
            "/servizi",
            "Servizi | MUV Fitness Legnago",
            "EMS, personal training, pilates e consulenza nutrizionale.",
            0.9,
            ChangeFreq::Weekly,
        ),
        route(
            "/chi-siamo",
            "Chi siamo | MUV Fitness Legnago",
            "Il team e la filosofia di MUV Fitness.",
            0.7,
            ChangeFreq::Monthly,
        ),
        route(
            "/contatti",
            "Contatti | MUV Fitness Legnago",
            "Orari, indirizzo e contatti di MUV Fitness a Legnago.",
            0.8,
            ChangeFreq::Monthly,
        ),
        route(
            "/blog",
            "Blog | MUV Fitness Legnago",
            "Articoli su allenamento, EMS e benessere.",
            0.8,
            ChangeFreq::Daily,
        ),
    ]
}

pub async fn run(path: PathBuf) -> Result<()> {
    println!("Initializing muv-seo in: {}", path.display());
    let written = write_starter_files(&path)?;
    for file in &written {
        println!("   ✓ Created {}", file.display());
    }

    println!("\nNext steps:");
    println!("   1. Edit {} and {}", CONFIG_FILE, ROUTES_FILE);
    println!("   2. muv-seo --config {} generate", path.join(CONFIG_FILE).display());
    Ok(())
}

fn write_starter_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let config_path = dir.join(CONFIG_FILE);
    let routes_path = dir.join(ROUTES_FILE);

    for existing in [&config_path, &routes_path] {
        if existing.exists() {
            anyhow::bail!(
                "{} already exists\nRemove it or choose another directory",
                existing.display()
            );
        }
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    fs::write(&config_path, STARTER_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let routes = serde_json::to_string_pretty(&starter_routes())
        .context("Failed to serialize starter routes")?;
    fs::write(&routes_path, routes + "\n")
        .with_context(|| format!("Failed to write {}", routes_path.display()))?;

    Ok(vec![config_path, routes_path])
}
