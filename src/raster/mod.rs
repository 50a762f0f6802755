pub(crate) mod buffer;
pub(crate) mod lane;
pub(crate) mod layout;
pub(crate) mod nodata;
pub(crate) mod source;
