use crate::config::Table;
use std::collections::BTreeMap;
use toml::Value;

/// Alias keys that older configurations and scripts still use, mapped to
/// their canonical names. An alias is renamed only when the canonical key is
/// absent; an explicitly supplied CLI alias always wins.
const ALIASES: &[(&str, &str)] = &[("is_smooth", "smooth")];

/// CLI override layer. Keys are dotted paths (`job.name`, `script.smooth`),
/// `None` is the unset sentinel: it never overrides anything, while
/// `Some(false)` or `Some(0)` still do.
pub type Overrides = BTreeMap<String, Option<Value>>;

/// built-in defaults, the lowest-precedence layer of every merge
pub fn default_config() -> Table {
    let mut environment = Table::new();
    environment.insert("backend".to_string(), Value::String("local".to_string()));

    let mut job = Table::new();
    job.insert("name".to_string(), Value::String("job".to_string()));
    job.insert("time".to_string(), Value::Integer(10000));

    let mut config = Table::new();
    config.insert("environment".to_string(), Value::Table(environment));
    config.insert("job".to_string(), Value::Table(job));
    config
}

/// combine defaults, the configuration file and CLI overrides into one
/// resolved configuration
///
/// Precedence is defaults < file < CLI. Tables are merged key-by-key at the
/// top two levels, everything deeper (scan range tables included) is replaced
/// wholesale. This never fails; absent keys simply stay absent.
pub fn merge(defaults: &Table, file: &Table, cli: &Overrides) -> Table {
    let mut merged = defaults.clone();
    overlay(&mut merged, file, 0);
    resolve_aliases(&mut merged);

    for (key, value) in cli {
        let Some(value) = value else {
            // argument was never supplied
            continue;
        };

        insert_path(&mut merged, &canonical(key), value.clone());
    }

    merged
}

/// overlay `layer` onto `target`: full replace for scalars and arrays,
/// key-by-key merge for section tables
fn overlay(target: &mut Table, layer: &Table, depth: usize) {
    for (key, value) in layer {
        match (target.get_mut(key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) if depth < 1 => {
                overlay(existing, incoming, depth + 1);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// rename alias keys to their canonical form, top level and one section deep
fn resolve_aliases(config: &mut Table) {
    apply_aliases(config);

    let sections: Vec<String> = config.keys().cloned().collect();
    for section in sections {
        if let Some(Value::Table(table)) = config.get_mut(&section) {
            apply_aliases(table);
        }
    }
}

fn apply_aliases(table: &mut Table) {
    for (alias, canonical) in ALIASES {
        if table.contains_key(*alias) && !table.contains_key(*canonical) {
            if let Some(value) = table.remove(*alias) {
                table.insert((*canonical).to_string(), value);
            }
        }
    }
}

/// resolve the alias table against the last segment of a dotted CLI key
fn canonical(key: &str) -> String {
    let (head, tail) = match key.rsplit_once('.') {
        Some((head, tail)) => (Some(head), tail),
        None => (None, key),
    };

    let tail = ALIASES
        .iter()
        .find(|(alias, _)| *alias == tail)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(tail);

    match head {
        Some(head) => format!("{head}.{tail}"),
        None => tail.to_string(),
    }
}

/// insert a value at a dotted path, creating intermediate tables as needed
fn insert_path(target: &mut Table, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((section, rest)) => {
            let entry = target
                .entry(section.to_string())
                .or_insert(Value::Table(Table::new()));

            match entry {
                Value::Table(table) => insert_path(table, rest, value),
                other => {
                    // a scalar is in the way, replace it with a fresh table
                    let mut table = Table::new();
                    insert_path(&mut table, rest, value);
                    *other = Value::Table(table);
                }
            }
        }
    }
}
