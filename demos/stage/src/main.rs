use limelight::flow::{ViewerConfig, run};

/// Drop a `monkey.glb` (or any animated .glb) into `assets/` next to the
/// binary and watch the show.
fn main() -> anyhow::Result<()> {
    run(ViewerConfig {
        asset: "monkey.glb".to_string(),
        title: "limelight stage".to_string(),
    })
}
