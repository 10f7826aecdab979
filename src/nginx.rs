use std::fmt::Write;

use tracing::info;

use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};
use crate::proxy::ProxySite;
use crate::remote::Remote;
use crate::script::quote;

pub const SITES_AVAILABLE: &str = "/etc/nginx/sites-available";
pub const SITES_ENABLED: &str = "/etc/nginx/sites-enabled";

/// Render the site file for `site`.
#[must_use]
pub fn render(site: &ProxySite) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "server {{");
    let _ = writeln!(out, "    listen {};", site.listen);
    let _ = writeln!(out, "    server_name {};", site.server_name);
    let _ = writeln!(out);
    let _ = writeln!(out, "    location / {{");
    let _ = writeln!(out, "        proxy_pass {};", site.upstream);
    for (key, value) in &site.headers {
        let _ = writeln!(out, "        proxy_set_header {key} {value};");
    }
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "}}");
    out
}

#[must_use]
pub fn available_path(site_name: &str) -> String {
    format!("{SITES_AVAILABLE}/{site_name}")
}

#[must_use]
pub fn enabled_path(site_name: &str) -> String {
    format!("{SITES_ENABLED}/{site_name}")
}

/// Point the reverse proxy at the configured port.
///
/// Fails with [`DeployError::EmptyPort`] before touching the host
/// when no port was given.
pub fn configure(remote: &dyn Remote, config: &DeployConfig) -> DeployResult<ProxySite> {
    let port = config.require_port()?;
    let site = ProxySite::new(&config.settings.site_name, port);
    install(remote, &site)?;
    Ok(site)
}

/// Write the site, enable it in place of the stock default site,
/// then validate and reload. Nothing is reloaded when `nginx -t`
/// fails, so the running configuration stays live.
pub fn install(remote: &dyn Remote, site: &ProxySite) -> DeployResult<()> {
    let available = available_path(&site.name);
    let enabled = enabled_path(&site.name);

    info!(site = %site.name, upstream = %site.upstream, "writing nginx site");
    remote.write_file(&render(site), &available)?;
    remote.exec(&format!("sudo rm -f {}", quote(&enabled_path("default"))))?;
    remote.exec(&format!(
        "sudo ln -sf {} {}",
        quote(&available),
        quote(&enabled)
    ))?;

    validate(remote)?;
    reload(remote)
}

/// Remove both site files and reload. Missing files are fine.
pub fn remove(remote: &dyn Remote, site_name: &str) -> DeployResult<()> {
    info!(site = %site_name, "removing nginx site");
    remote.exec(&format!(
        "sudo rm -f {} {}",
        quote(&available_path(site_name)),
        quote(&enabled_path(site_name))
    ))?;
    reload(remote)
}

/// `nginx -t`.
pub fn validate(remote: &dyn Remote) -> DeployResult<()> {
    let out = remote.run("sudo nginx -t", None)?;
    if out.success() {
        info!("nginx configuration valid");
        Ok(())
    } else {
        Err(DeployError::ProxyValidation(out.stderr.trim().to_string()))
    }
}

pub fn reload(remote: &dyn Remote) -> DeployResult<()> {
    remote.exec("sudo systemctl reload nginx")?;
    info!("nginx reloaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_site() {
        let result = render(&ProxySite::new("app", 8000));

        assert_eq!(
            result,
            "\
server {
    listen 80;
    server_name _;

    location / {
        proxy_pass http://127.0.0.1:8000;
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
    }
}
"
        );
    }

    #[test]
    fn custom_listen_and_server_name() {
        let mut site = ProxySite::new("app", 3000);
        site.listen = 8080;
        site.server_name = "example.com".to_string();

        let result = render(&site);

        assert!(result.contains("listen 8080;"));
        assert!(result.contains("server_name example.com;"));
    }

    #[test]
    fn site_paths() {
        assert_eq!(available_path("app"), "/etc/nginx/sites-available/app");
        assert_eq!(enabled_path("app"), "/etc/nginx/sites-enabled/app");
    }
}
