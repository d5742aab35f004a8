#[cfg(feature = "hello-world")]
pub mod hello_world;
