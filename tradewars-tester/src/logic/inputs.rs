use anyhow::{Result, bail};
use tradewars_game::Role;

pub const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed tokens into a deduplicated, ordered seed list.
///
/// Supports decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hex. Falls back to [`DEFAULT_SEED`] when nothing is given.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let seed = if let Ok(value) = token.parse::<u64>() {
            value
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            && let Ok(value) = u64::from_str_radix(&hex.replace('_', ""), 16)
        {
            value
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }

    Ok(seeds)
}

/// Resolve CLI role tokens; `all` expands to both roles in selection order.
pub fn resolve_roles(tokens: &[String]) -> Result<Vec<Role>> {
    let mut roles: Vec<Role> = Vec::new();
    for token in tokens {
        let parsed: Vec<Role> = if token.eq_ignore_ascii_case("all") {
            Role::ALL.to_vec()
        } else if let Ok(role) = token.parse::<Role>() {
            vec![role]
        } else {
            bail!("Unrecognized role: {token}");
        };
        for role in parsed {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
    }
    if roles.is_empty() {
        roles.extend(Role::ALL);
    }
    Ok(roles)
}
