pub(crate) mod layer;
pub(crate) mod object;
pub(crate) mod project;
pub(crate) mod transform;
