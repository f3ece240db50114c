//! Apache virtual host definition

use std::fmt::Write;

use crate::config::{APP_PORT, Configuration, SERVICE_NAME};

/// Modules the site relies on
pub fn required_modules(tls: bool) -> Vec<&'static str> {
    let mut modules = vec![
        "rewrite",
        "proxy",
        "proxy_http",
        "proxy_wstunnel",
        "headers",
        "expires",
    ];
    if tls {
        modules.push("ssl");
    }
    modules
}

pub fn site(config: &Configuration, tls: bool) -> String {
    let domain = config.domain();
    let mut out = String::from("# Secret Poll - apache site\n");

    if tls {
        let _ = write!(
            out,
            r#"<VirtualHost *:80>
    ServerName {domain}
    Redirect permanent / https://{domain}/
</VirtualHost>

<VirtualHost *:443>
    ServerName {domain}

    SSLEngine on
    SSLCertificateFile {cert}/fullchain.pem
    SSLCertificateKeyFile {cert}/privkey.pem
    Header always set Strict-Transport-Security "max-age=31536000; includeSubDomains"
"#,
            cert = config.cert_dir().display()
        );
        out.push_str(&body(config, "_ssl"));
    } else {
        let _ = writeln!(out, "<VirtualHost *:80>\n    ServerName {domain}");
        out.push_str(&body(config, ""));
    }

    out.push_str("</VirtualHost>\n");
    out
}

/// Directives shared by the plain and TLS virtual hosts
fn body(config: &Configuration, log_suffix: &str) -> String {
    let build = config.build_dir();
    let build = build.display();

    format!(
        r#"    DocumentRoot {build}

    Header always set X-Frame-Options DENY
    Header always set X-Content-Type-Options nosniff
    Header always set X-XSS-Protection "1; mode=block"

    ProxyPreserveHost On
    ProxyTimeout 86400

    RewriteEngine On
    RewriteCond %{{HTTP:Upgrade}} =websocket [NC]
    RewriteCond %{{HTTP:Connection}} upgrade [NC]
    RewriteRule ^/api/(.*) ws://localhost:{APP_PORT}/api/$1 [P,L]

    ProxyPass /api/ws/ ws://localhost:{APP_PORT}/api/ws/
    ProxyPassReverse /api/ws/ ws://localhost:{APP_PORT}/api/ws/
    ProxyPass /api/ http://localhost:{APP_PORT}/api/
    ProxyPassReverse /api/ http://localhost:{APP_PORT}/api/

    <Directory {build}>
        Options FollowSymLinks
        AllowOverride All
        Require all granted

        RewriteEngine On
        RewriteBase /
        RewriteRule ^index\.html$ - [L]
        RewriteCond %{{REQUEST_FILENAME}} !-f
        RewriteCond %{{REQUEST_FILENAME}} !-d
        RewriteRule . /index.html [L]
    </Directory>

    <FilesMatch "\.(js|css|png|jpg|jpeg|gif|ico|svg|woff|woff2)$">
        ExpiresActive On
        ExpiresDefault "access plus 1 year"
        Header set Cache-Control "public, immutable"
    </FilesMatch>

    ErrorLog ${{APACHE_LOG_DIR}}/{SERVICE_NAME}{log_suffix}_error.log
    CustomLog ${{APACHE_LOG_DIR}}/{SERVICE_NAME}{log_suffix}_access.log combined
"#
    )
}
