use super::{Identical, Markers, Space};

/// An element followed by the whitespace before the next token (e.g. `,`)
#[derive(Debug, Clone)]
pub struct RightPadded<T> {
    pub element: T,
    pub after: Space,
    pub markers: Markers,
}

/// An element preceded by the whitespace after a token (e.g. `=`, `.`)
#[derive(Debug, Clone)]
pub struct LeftPadded<T> {
    pub before: Space,
    pub element: T,
    pub markers: Markers,
}

/// A delimited, separated list such as `(a, b)`
///
/// `before` is the space in front of the opening delimiter; each element's
/// `after` is the space in front of the following separator or closing delimiter.
#[derive(Debug, Clone)]
pub struct Container<T> {
    pub before: Space,
    pub elements: Vec<RightPadded<T>>,
    pub markers: Markers,
}

impl<T> RightPadded<T> {
    pub fn new(element: T, after: Space) -> Self {
        Self {
            element,
            after,
            markers: Markers::new(),
        }
    }

    pub fn build(element: T) -> Self {
        Self::new(element, Space::EMPTY)
    }

    pub fn with_markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }
}

impl<T: Identical + Clone> RightPadded<T> {
    /// Rebuild only if a part actually changed
    pub fn with_parts(&self, element: T, after: Space, markers: Markers) -> Self {
        if element.identical(&self.element)
            && after == self.after
            && markers.identical(&self.markers)
        {
            self.clone()
        } else {
            Self {
                element,
                after,
                markers,
            }
        }
    }
}

impl<T> LeftPadded<T> {
    pub fn new(before: Space, element: T) -> Self {
        Self {
            before,
            element,
            markers: Markers::new(),
        }
    }

    pub fn build(element: T) -> Self {
        Self::new(Space::EMPTY, element)
    }

    pub fn with_markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }
}

impl<T: Identical + Clone> LeftPadded<T> {
    /// Rebuild only if a part actually changed
    pub fn with_parts(&self, before: Space, element: T, markers: Markers) -> Self {
        if element.identical(&self.element)
            && before == self.before
            && markers.identical(&self.markers)
        {
            self.clone()
        } else {
            Self {
                before,
                element,
                markers,
            }
        }
    }
}

impl<T> Container<T> {
    pub fn new(before: Space, elements: Vec<RightPadded<T>>) -> Self {
        Self {
            before,
            elements,
            markers: Markers::new(),
        }
    }

    pub fn build(elements: Vec<RightPadded<T>>) -> Self {
        Self::new(Space::EMPTY, elements)
    }

    pub fn elements(&self) -> impl Iterator<Item = &T> {
        self.elements.iter().map(|e| &e.element)
    }
}

impl<T: Identical> Identical for RightPadded<T> {
    fn identical(&self, other: &Self) -> bool {
        self.element.identical(&other.element)
            && self.after == other.after
            && self.markers.identical(&other.markers)
    }
}

impl<T: Identical> Identical for LeftPadded<T> {
    fn identical(&self, other: &Self) -> bool {
        self.element.identical(&other.element)
            && self.before == other.before
            && self.markers.identical(&other.markers)
    }
}

impl<T: Identical> Identical for Container<T> {
    fn identical(&self, other: &Self) -> bool {
        self.before == other.before
            && self.elements.identical(&other.elements)
            && self.markers.identical(&other.markers)
    }
}
