use lightbox::{run_demo, MultipleLights};

fn main() {
    env_logger::init();
    std::process::exit(run_demo(MultipleLights));
}
