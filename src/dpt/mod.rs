//! Datapoint-type translators: each KNX DPT family gets a type implementing
//! [`DptXlator`], converting between the group-address payload bytes on the
//! wire and a textual or strongly-typed representation.

pub mod translator;

pub mod dpt1;
pub mod dpt2;
pub mod dpt3;
pub mod dpt5;
pub mod dpt6;
pub mod dpt7;
pub mod dpt8;
pub mod dpt9;
pub mod dpt10;
pub mod dpt11;
pub mod dpt12;
pub mod dpt13;
pub mod dpt14;
pub mod dpt16;
pub mod dpt17;
pub mod dpt18;
pub mod dpt19;
pub mod dpt20;
pub mod dpt22;
pub mod dpt28;
pub mod dpt29;
pub mod dpt_color;
pub mod dpt_step_control;

pub use translator::{DptXlator, SubType};

pub use dpt1::Dpt1Xlator;
pub use dpt2::{Controlled1Bit, Dpt2Xlator};
pub use dpt3::{ControlledStep, Dpt3Xlator};
pub use dpt5::Dpt5Xlator;
pub use dpt6::{Dpt6Xlator, StatusMode3};
pub use dpt7::{Dpt7Xlator, Scale as Dpt7Scale};
pub use dpt8::{Dpt8Xlator, Scale as Dpt8Scale};
pub use dpt9::Dpt9Xlator;
pub use dpt10::{Dpt10Xlator, TimeOfDay};
pub use dpt11::{Date, Dpt11Xlator};
pub use dpt12::Dpt12Xlator;
pub use dpt13::Dpt13Xlator;
pub use dpt14::Dpt14Xlator;
pub use dpt16::{Charset, Dpt16Xlator};
pub use dpt17::Dpt17Xlator;
pub use dpt18::{Dpt18Xlator, SceneControl};
pub use dpt19::{DateTime, Dpt19Xlator};
pub use dpt20::{Dpt20Xlator, EnumDef, EnumMember, HVAC_MODE};
pub use dpt22::{BitDef, Dpt22Xlator, HVAC_STATUS};
pub use dpt28::Dpt28Xlator;
pub use dpt29::Dpt29Xlator;
pub use dpt_color::{Dpt232Xlator, Dpt242Xlator, Dpt251Xlator, Rgb, Rgbw, XyY};
pub use dpt_step_control::{ColourTransition, Dpt249Xlator, StepControl};
