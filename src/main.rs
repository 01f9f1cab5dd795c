use castle_viewer::ViewerSettings;

fn main() -> anyhow::Result<()> {
    let mut settings = ViewerSettings::default();
    if let Some(model_path) = std::env::args().nth(1) {
        settings = settings.with_model_path(model_path);
    }
    castle_viewer::run(settings)?;
    Ok(())
}
