//! Framework config entry point
//!
//! Runs the startup path the host application takes: load the options,
//! persist them once so the file is normalized, and print the option form.

use framework_config::form::Form;

fn main() {
    env_logger::init();
    log::info!("Framework config starting...");

    let cache = framework_config::config();
    cache.set_listener(|options| {
        log::info!(
            "Config changed ({} custom objects)",
            options.custom_object_list.len()
        );
    });

    let options = cache.get_and_save();
    match Form::build(&options) {
        Ok(form) => print!("{form}"),
        Err(e) => log::error!("Unable to build option form: {}", e),
    }
}
