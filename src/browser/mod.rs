pub mod provisioner;
pub mod secondary;
pub mod session;
pub mod tabs;

pub use provisioner::{BrowserProvisioner, LaunchProfile, RemoteFamily};
pub use secondary::SecondarySessionRunner;
pub use session::{Session, SessionRegistry};
pub use tabs::TabCoordinator;
