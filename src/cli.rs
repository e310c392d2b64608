mod args;

pub use args::{Cli, Command, PackageArgs, PublishArgs};
