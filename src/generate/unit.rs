//! systemd unit for the application process

use crate::config::{Configuration, SERVICE_ACCOUNT};

pub fn service(config: &Configuration, datastore_unit: &str) -> String {
    let backend = config.backend_dir();
    let backend = backend.display();

    format!(
        "[Unit]
Description=Secret Poll application
After=network.target {datastore_unit}.service
Wants={datastore_unit}.service

[Service]
Type=simple
User={SERVICE_ACCOUNT}
Group={SERVICE_ACCOUNT}
WorkingDirectory={backend}
EnvironmentFile={backend}/.env
Environment=PATH={backend}/venv/bin:/usr/local/bin:/usr/bin:/bin
ExecStart={backend}/venv/bin/python server.py
Restart=always
RestartSec=3
StandardOutput=journal
StandardError=journal

[Install]
WantedBy=multi-user.target
"
    )
}
