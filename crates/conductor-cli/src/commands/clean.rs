//! `conductor clean`: delete the artifacts directory.

use conductor_core::ArtifactStore;

use super::Settings;

pub async fn run(settings: &Settings) -> Result<(), String> {
    let store = ArtifactStore::new(&settings.artifacts_dir);
    if store.clean().await.map_err(|e| e.to_string())? {
        println!("🧹 Removed {}", store.root().display());
    } else {
        println!("Nothing to clean: {} does not exist", store.root().display());
    }
    Ok(())
}
