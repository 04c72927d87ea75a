//! Hosts-file collaborator.
//!
//! Turns hosts-style text into `(ipv4 string, domain name)` pairs for
//! [`DnsCache::load`](crate::cache::DnsCache::load). Comment and blank
//! lines are filtered here.

use std::{fs, io, path::Path};

/// Iterate the `(address, hostname)` pairs of hosts-style content.
///
/// Lines starting with `#` and blank lines are skipped; only the first
/// hostname of a line is taken, aliases are ignored.
pub fn parse(content: &str) -> impl Iterator<Item = (String, String)> + '_ {
    content.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let mut fields = line.split_ascii_whitespace();
        let ip = fields.next()?;
        let name = fields.next()?;
        Some((ip.to_string(), name.to_string()))
    })
}

/// Read a hosts file into its `(address, hostname)` pairs.
pub fn read_pairs<P: AsRef<Path>>(path: P) -> io::Result<Vec<(String, String)>> {
    let content = fs::read_to_string(path)?;
    Ok(parse(&content).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let content = "\
# local entries
127.0.0.1 localhost

   # indented comment
192.168.1.1 www.site1.com alias.site1.com
10.0.0.1
";
        let pairs: Vec<_> = parse(content).collect();
        assert_eq!(
            pairs,
            vec![
                ("127.0.0.1".to_string(), "localhost".to_string()),
                ("192.168.1.1".to_string(), "www.site1.com".to_string()),
            ]
        );
    }

    #[test]
    fn empty_content_yields_nothing() {
        assert_eq!(parse("").count(), 0);
    }
}
