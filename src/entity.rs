pub(crate) use crate::persistence::*;
