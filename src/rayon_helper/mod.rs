#[cfg(feature = "parallel")]
pub(crate) use rayon::prelude::*;

/// Choose between iter and par_iter
#[cfg(not(feature = "parallel"))]
macro_rules! iter {
    ($e:expr) => {
        $e.iter()
    };
}

/// Choose between iter and par_iter
#[cfg(feature = "parallel")]
macro_rules! iter {
    ($e:expr) => {
        $e.par_iter()
    };
}

pub(crate) use iter;
