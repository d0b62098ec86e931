//! `describe` and `sample-config` commands.

use dispatcher::plugin::{registered_outputs, DESCRIPTION, SAMPLE_CONFIG};

/// Print the output's one-line description
pub fn run_describe() -> anyhow::Result<()> {
    for name in registered_outputs() {
        println!("{}: {}", name, DESCRIPTION);
    }
    Ok(())
}

/// Print the annotated sample configuration
pub fn run_sample_config() -> anyhow::Result<()> {
    print!("{}", SAMPLE_CONFIG);
    Ok(())
}
