use lightbox::{run_demo, BasicTexture};

fn main() {
    env_logger::init();
    std::process::exit(run_demo(BasicTexture));
}
