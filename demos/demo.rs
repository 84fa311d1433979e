use morfdict::{Factory, Registry};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AppConfig {
    app: AppSection,
    database: DatabaseSection,
}

#[derive(Debug, Deserialize)]
struct AppSection {
    name: String,
    debug: bool,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DatabaseSection {
    host: String,
    port: i64,
    name: String,
    url: String,
}

fn main() -> Result<(), morfdict::Error> {
    let mut registry = Registry::new();
    registry.register_fn("default", |settings, paths| {
        settings.set("app:name", "demo")?;
        settings.set("app:debug", false)?;
        settings.set("database:host", "localhost")?;
        settings.set("database:port", 5432)?;
        settings.set("database:name", "demo_db")?;
        settings.set(
            "database:url",
            "postgres://%(database:host)s:%(database:port)s/%(database:name)s",
        )?;

        let mut var = paths.set("var", "var", None, true);
        var.set("logs", "log", false);
        var.set("cache", "cache", false);
        Ok(())
    });
    registry.register_fn("local", |settings, _paths| {
        settings.set("app:debug", true)?;
        Ok(())
    });

    let (settings, paths) = Factory::new(registry, "default")
        .with_file("demos/local.toml", false)
        .with_module("local", false)
        .build()?;

    // Deserialize once; subsequent reads are plain field access
    let config: AppConfig = settings.build()?;

    println!("App: {} (debug={})", config.app.name, config.app.debug);
    println!("Database URL: {}", config.database.url);
    println!("Paths:\n{}", paths.to_tree()?);

    Ok(())
}
