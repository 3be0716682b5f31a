//! Prompt templates for the three stages and a single-pass `{key}` renderer.

pub const KEY_PROMPT: &str = "prompt";
pub const KEY_FILEPATHS: &str = "filepaths";
pub const KEY_TARGET_JSON: &str = "target_json";
pub const KEY_SHARED_DEPENDENCIES: &str = "shared_dependencies";
pub const KEY_FILENAME: &str = "filename";

pub const FILE_PATHS_PROMPT: &str = r#"
You are an AI developer who is trying to write a program that will generate code for the user based on their intent.

When given their intent, create a complete, exhaustive list of filepaths that the user would write to make the program. You should include a Makefile and a Dockerfile.

Don't generate package lock files for any language.

Your response must be JSON formatted and contain the following keys:
"filepaths": a list of strings that are the filepaths that the user would write to make the program.
"reasoning": a list of strings that explain your chain of thought (include 5-10)

Do not emit any other output."#;

pub const SHARED_DEPENDENCIES_PROMPT: &str = r#"
You are an AI developer who is trying to write a program that will generate code for the user based on their intent.

In response to the user's prompt:

---
the app is: {prompt}
---

the files we have decided to generate are: {filepaths}

Now that we have a list of files, we need to understand what dependencies they share.
Please name and briefly describe what is shared between the files we are generating, including exported variables, data schemas, id names of every DOM elements that javascript functions will use, message names, and function names.

Your response must be JSON formatted and contain the following keys:
"shared_dependencies": the list of shared dependencies, include a symbol name, a description, and the set of symbols or files. use "name", "description", and "symbols" as the keys.
"reasoning": a list of strings that explain your chain of thought (include 5-10).
The symbols should be a map of symbol name to symbol description. ("symbols": {"(symbol_name)": "(symbol_description)"})

Your output should be JSON should look like:
{target_json}

Do not emit any other output."#;

pub const SHARED_DEPENDENCIES_REQUEST: &str =
    "List the shared dependencies for the files above as JSON.";

pub const CODE_GENERATION_SYSTEM_PROMPT: &str = r#"
You are an AI developer who is trying to write a program that will generate code for the user based on their intent.

the app is: {prompt}

the files we have decided to generate are: {filepaths}

the shared dependencies (like filenames and variable names) we have decided on are: {shared_dependencies}

only write valid code for the given filepath and file type, and return only the code.
do not add any other explanation, only return valid code for that file type."#;

pub const CODE_GENERATION_PROMPT: &str = r#"
We have broken up the program into per-file generation.
Now your job is to generate only the code for the file {filename}.
Make sure to have consistent filenames if you reference other files we are also generating.

Remember that you must obey 3 things:
   - you are generating code for the file {filename}
   - do not stray from the names of the files and the shared dependencies we have decided on
   - MOST IMPORTANT OF ALL - the purpose of our app is {prompt} - every line of code you generate must be valid code. Do not include code fences in your response, for example

Bad response:
```javascript
console.log("hello world")
```

Good response:
console.log("hello world")

Begin generating the specified file now (with surrounding text):
"#;

/// Substitute `{key}` placeholders in one pass. Unknown `{...}` spans are left verbatim and
/// substituted values are never re-scanned, so user text containing braces is safe.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
