//! Environment files for the backend and frontend

use super::SecretKey;
use crate::config::{APP_PORT, Configuration, DATASTORE_URL};

/// Origins the backend accepts browser requests from
pub fn cors_origins(config: &Configuration) -> String {
    let domain = config.domain();
    if config.enable_ssl() {
        format!("http://{domain},https://{domain}")
    } else {
        format!("http://{domain}")
    }
}

pub fn backend(config: &Configuration, secret_key: &SecretKey) -> String {
    format!(
        "# Secret Poll backend environment\n\
         MONGO_URL={DATASTORE_URL}\n\
         PORT={APP_PORT}\n\
         ENVIRONMENT={environment}\n\
         CORS_ORIGINS={origins}\n\
         SECRET_KEY={secret}\n",
        environment = config.environment(),
        origins = cors_origins(config),
        secret = secret_key.as_str(),
    )
}

pub fn frontend(config: &Configuration) -> String {
    format!(
        "# Secret Poll frontend environment\n\
         REACT_APP_BACKEND_URL={url}\n\
         GENERATE_SOURCEMAP=false\n\
         NODE_ENV={environment}\n",
        url = config.public_url(config.enable_ssl()),
        environment = config.environment(),
    )
}
