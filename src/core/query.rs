// URL query helpers mirroring browser-style parameter access.
use std::collections::BTreeMap;

use url::Url;

use crate::core::error::{Error, ErrorKind};

/// All query pairs of `url`, percent-decoded. Later duplicates win.
pub fn query_params(url: &str) -> Result<BTreeMap<String, String>, Error> {
    let parsed = parse(url)?;
    let mut params = BTreeMap::new();
    for (key, value) in parsed.query_pairs() {
        params.insert(key.into_owned(), value.into_owned());
    }
    Ok(params)
}

/// The first value of `name` in `url`'s query, or `None` when absent.
pub fn query_param(url: &str, name: &str) -> Result<Option<String>, Error> {
    let parsed = parse(url)?;
    Ok(parsed.query_pairs().find_map(|(key, value)| {
        if key == name {
            Some(value.into_owned())
        } else {
            None
        }
    }))
}

fn parse(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid url")
            .with_url(url)
            .with_source(err)
    })
}
