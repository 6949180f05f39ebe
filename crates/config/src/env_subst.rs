/// Replace `${ENV_VAR}` placeholders in config string values.
///
/// Unset variables and empty names are left as-is; an unterminated `${` keeps
/// the rest of the input literal.
pub fn substitute_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // No closing brace: nothing past this point can be a placeholder.
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after[..end];
        match resolve(name) {
            Some(val) => out.push_str(&val),
            None => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn resolve(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    std::env::var(name).ok()
}
