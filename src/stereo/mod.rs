pub(crate) mod disparity;
