//! Limb Rig - procedural three-joint limb rig synthesis
//!
//! Builds a complete limb rig into any [`SceneGraph`] from three segment
//! guides and a pole-vector guide:
//! - IK, FK and bind joint chains
//! - FK, IK, pole-vector and settings controls, tagged and registered by role
//! - A per-channel FK/IK blend network driving the bind chain
//! - Optional IK and FK stretch networks
//! - A canonical group tree with global scale, locks, colors and visibility
//!   switching
//!
//! # Example
//!
//! ```rust
//! use limb_rig::prelude::*;
//! use limb_scene::prelude::*;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut scene = Scene::new();
//! let guides = RigFile::from_toml_str(r#"
//!     add_stretch = true
//!     guides = [
//!         { name = "g0", translate = [0.0, 0.0, 0.0] },
//!         { name = "g1", translate = [10.0, 0.0, 0.0] },
//!         { name = "g2", translate = [20.0, 0.0, 0.0] },
//!     ]
//!     pole_vector = { name = "pv", translate = [10.0, 0.0, -10.0] }
//! "#)?;
//! let set = guides.instantiate(&mut scene)?;
//! let rig = build(&mut scene, guides.build.clone(), set)?;
//!
//! let settings = rig.settings.node;
//! assert_eq!(scene.get_f64(&settings.plug("fkIk"))?, 1.0);
//! let rest = rig.stretch.map(|s| s.ik.rest_length).unwrap_or_default();
//! assert!((rest - 20.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(unreachable_pub)]

pub mod axis;
pub mod blend;
pub mod builder;
pub mod chain;
pub mod config;
pub mod controls;
pub mod error;
pub mod finalize;
pub mod hierarchy;
pub mod logging;
pub mod naming;
pub mod report;
pub mod shapes;
pub mod spec;
pub mod stretch;
pub mod xform;

pub use axis::{Axis, SignedAxis};
pub use blend::BlendUnit;
pub use builder::{build, LimbBuilder, LimbRig};
pub use chain::{ChainRole, Chains, JointChain};
pub use config::{GuideSpec, RigFile};
pub use controls::{Control, ControlRegistry, IkControls, CONTROL_TYPE_ATTR, FK_IK_ATTR};
pub use error::{ConfigError, RigError, RigResult};
pub use hierarchy::{Hierarchy, GLOBAL_SCALE_ATTR};
pub use naming::RigNames;
pub use report::RigReport;
pub use spec::{BuildSpec, ControlRole, GuideSet, Rgb, SEGMENTS};
pub use stretch::{StretchNetwork, STRETCH_ATTR};
pub use xform::Channel;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building limbs
    pub use crate::{
        build, BuildSpec, Channel, ControlRole, GuideSet, LimbBuilder, LimbRig, RigError,
        RigFile, RigResult, Rgb, SignedAxis,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
