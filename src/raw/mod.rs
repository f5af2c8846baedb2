mod arena;
mod blk;
mod raw_ksl;

pub(crate) use arena::Handle;
pub(crate) use raw_ksl::RawKsl;
