#[cfg(feature = "core")]
#[doc(inline)]
pub use vartier_core as core;

#[cfg(feature = "annot")]
#[doc(inline)]
pub use vartier_annot as annot;

#[cfg(feature = "report")]
#[doc(inline)]
pub use vartier_report as report;
