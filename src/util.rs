pub(crate) mod str;
pub(crate) mod text;
pub(crate) mod uri;
