//! Nginx site definition

use std::fmt::Write;

use crate::config::{APP_PORT, Configuration};

pub fn site(config: &Configuration, tls: bool) -> String {
    let domain = config.domain();
    let build = config.build_dir();
    let cert_dir = config.cert_dir();

    let mut out = String::new();
    out.push_str("# Secret Poll - nginx site\n");
    out.push_str("server {\n");
    out.push_str("    listen 80;\n");
    let _ = writeln!(out, "    server_name {domain};");

    if tls {
        out.push_str("\n    return 301 https://$server_name$request_uri;\n");
        out.push_str("}\n\n");
        out.push_str("server {\n");
        out.push_str("    listen 443 ssl http2;\n");
        let _ = writeln!(out, "    server_name {domain};");
        out.push('\n');
        let _ = writeln!(
            out,
            "    ssl_certificate {}/fullchain.pem;",
            cert_dir.display()
        );
        let _ = writeln!(
            out,
            "    ssl_certificate_key {}/privkey.pem;",
            cert_dir.display()
        );
        out.push_str(
            "    add_header Strict-Transport-Security \"max-age=31536000; includeSubDomains\" always;\n",
        );
    }

    let _ = write!(
        out,
        r#"
    root {build};
    index index.html;

    add_header X-Frame-Options DENY;
    add_header X-Content-Type-Options nosniff;
    add_header X-XSS-Protection "1; mode=block";
    add_header Referrer-Policy strict-origin-when-cross-origin;

    location / {{
        try_files $uri $uri/ /index.html;
    }}

    location /api/ {{
        proxy_pass http://localhost:{APP_PORT};
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;

        proxy_http_version 1.1;
        proxy_set_header Upgrade $http_upgrade;
        proxy_set_header Connection "upgrade";
        proxy_read_timeout 86400;
        proxy_send_timeout 86400;
    }}

    location ~* \.(js|css|png|jpg|jpeg|gif|ico|svg|woff|woff2)$ {{
        expires 1y;
        add_header Cache-Control "public, immutable";
        access_log off;
    }}
}}
"#,
        build = build.display()
    );

    out
}
