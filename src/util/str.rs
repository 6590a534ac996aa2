pub(crate) trait StringExt {
    fn trim_in_place(&mut self);
}

impl StringExt for String {
    fn trim_in_place(&mut self) {
        self.truncate(self.trim_end().len());

        let start = self.len() - self.trim_start().len();
        if start > 0 {
            self.drain(..start);
        }
    }
}

pub(crate) trait StrExt {
    fn starts_with_ignore_case(&self, start: &str) -> bool;

    /// Ensures the value starts with a single `/`.
    fn rooted(&self) -> String;
}

impl StrExt for str {
    fn starts_with_ignore_case(&self, start: &str) -> bool {
        self.len() >= start.len() && self[..start.len()].eq_ignore_ascii_case(start)
    }

    fn rooted(&self) -> String {
        let trimmed = self.trim_start_matches('/');
        let mut rooted = String::with_capacity(trimmed.len() + 1);
        rooted.push('/');
        rooted.push_str(trimmed);
        rooted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_in_place() {
        #[rustfmt::skip]
        let expected = [
            ("a   b   c", "\n \r\t \n  a   b   c \r  \n\n\t"),
            ("", "  \r\n\t  \r \n"),
            ("", ""),
            ("x", "x"),
        ];

        for (expect, input) in expected {
            let mut string = input.to_owned();
            string.trim_in_place();
            assert_eq!(expect, string);
        }
    }

    #[test]
    fn test_rooted() {
        #[rustfmt::skip]
        let expected = [
            ("/OEBPS/c1.xhtml", "OEBPS/c1.xhtml"),
            ("/OEBPS/c1.xhtml", "/OEBPS/c1.xhtml"),
            ("/OEBPS/c1.xhtml", "///OEBPS/c1.xhtml"),
            ("/", ""),
        ];

        for (expect, input) in expected {
            assert_eq!(expect, input.rooted());
        }
    }
}
