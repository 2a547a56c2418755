// userd
// Copyright 2024 The userd Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Placeholder substitution for the embedded HTML pages.

/// Expands the `%key%` placeholders in the page `input`.
///
/// Every `key` that appears in the page must have exactly one value in `replacements`,
/// and a literal percent sign is written as `%%`.  Values are inserted as they are, so
/// a value that itself looks like a placeholder is not expanded again.
///
/// Panics on malformed pages or incomplete replacements.  The pages are compiled into
/// the binary so any such problem is a bug, not an input error.
pub(crate) fn apply(input: &'static str, replacements: &[(&'static str, &str)]) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('%') {
        output.push_str(&rest[..start]);
        rest = &rest[start + 1..];
        match rest.find('%') {
            Some(0) => {
                output.push('%');
                rest = &rest[1..];
            }
            Some(end) => {
                let key = &rest[..end];
                let mut values =
                    replacements.iter().filter(|(k, _)| *k == key).map(|(_, v)| *v);
                match values.next() {
                    Some(value) => output.push_str(value),
                    None => panic!("Placeholder {} has no replacement", key),
                }
                assert!(values.next().is_none(), "Multiple replacements for {}", key);
                rest = &rest[end + 1..];
            }
            None => panic!("Unterminated placeholder at end of page"),
        }
    }
    output.push_str(rest);
    output
}
