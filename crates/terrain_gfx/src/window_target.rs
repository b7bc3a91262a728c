/// Opaque native window handle. On Windows this is the `HWND` value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// The window the context presents into. The host owns it and its message
/// loop; the context only reads these values during construction.
pub trait WindowTarget {
    fn native_handle(&self) -> WindowHandle;
    fn client_width(&self) -> u32;
    fn client_height(&self) -> u32;
}
