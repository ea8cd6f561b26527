/// Longest name or label value the cluster accepts.
pub const MAX_NAME_LEN: usize = 63;

/// Stand-in when an identifier has nothing name-safe in it.
pub const PLACEHOLDER: &str = "x";

/// Reduce an arbitrary identifier to `[a-z0-9-]` with no leading, trailing
/// or repeated `-`.
pub fn to_k8s_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('-') {
        out.pop();
    }

    if out.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        out
    }
}

/// Pod name for one run: `task-<id>-<millis>`, cut to the length limit.
pub fn pod_name(task_id: &str, millis: i64) -> String {
    fit(format!("task-{}-{}", to_k8s_name(task_id), millis))
}

/// Label value carrying the task id.
pub fn task_label(task_id: &str) -> String {
    fit(to_k8s_name(task_id))
}

fn fit(mut name: String) -> String {
    // Only ASCII remains at this point, so byte truncation is safe.
    name.truncate(MAX_NAME_LEN);
    while name.ends_with('-') {
        name.pop();
    }
    name
}
