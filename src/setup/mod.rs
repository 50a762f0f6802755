pub(crate) mod border;
pub(crate) mod normalize;
pub(crate) mod reconcile;
