pub(crate) mod http_stub;
