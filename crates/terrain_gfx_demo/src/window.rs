use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use eyre::eyre;
use terrain_gfx::WindowHandle;
use terrain_gfx::WindowTarget;
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::VK_ESCAPE;
use windows::Win32::UI::WindowsAndMessaging::*;

const CLASS_NAME: PCWSTR = w!("TerrainGfxWindow");

/// Set by the window procedure once the window is gone.
static QUIT_REQUESTED: AtomicBool = AtomicBool::new(false);

/// A top-level Win32 window the render context presents into.
pub struct Win32Window {
    hwnd: HWND,
    width: u32,
    height: u32,
}

impl Win32Window {
    /// Registers the window class and creates a window whose client area is
    /// `width` x `height`. The window stays hidden until [`Win32Window::show`].
    pub fn create(title: &str, width: u32, height: u32) -> eyre::Result<Self> {
        let instance = unsafe { GetModuleHandleW(None)? };

        let class = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(wndproc),
            hInstance: instance.into(),
            hCursor: unsafe { LoadCursorW(None, IDC_ARROW)? },
            lpszClassName: CLASS_NAME,
            ..Default::default()
        };
        if unsafe { RegisterClassExW(&class) } == 0 {
            return Err(eyre!("RegisterClassExW failed"));
        }

        // Size the outer window so the client area matches the swap chain.
        let mut window_rect = RECT {
            left: 0,
            top: 0,
            right: width as i32,
            bottom: height as i32,
        };
        unsafe { AdjustWindowRect(&mut window_rect, WS_OVERLAPPEDWINDOW, false)? };

        let title = widestring::U16CString::from_str(title)?;
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                CLASS_NAME,
                PCWSTR(title.as_ptr()),
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                window_rect.right - window_rect.left,
                window_rect.bottom - window_rect.top,
                None,
                None,
                Some(instance.into()),
                None,
            )
        }?;

        let mut client_rect = RECT::default();
        unsafe { GetClientRect(hwnd, &mut client_rect)? };
        Ok(Self {
            hwnd,
            width: (client_rect.right - client_rect.left) as u32,
            height: (client_rect.bottom - client_rect.top) as u32,
        })
    }

    pub fn show(&self) {
        unsafe { _ = ShowWindow(self.hwnd, SW_SHOW) };
    }

    /// Drains the message queue. Returns false once the window has closed.
    pub fn pump_messages(&self) -> bool {
        let mut message = MSG::default();
        while unsafe { PeekMessageW(&mut message, None, 0, 0, PM_REMOVE) }.into() {
            unsafe {
                _ = TranslateMessage(&message);
                DispatchMessageW(&message);
            }
            if message.message == WM_QUIT {
                return false;
            }
        }
        !QUIT_REQUESTED.load(Ordering::Relaxed)
    }
}

impl WindowTarget for Win32Window {
    fn native_handle(&self) -> WindowHandle {
        WindowHandle(self.hwnd.0 as isize)
    }

    fn client_width(&self) -> u32 {
        self.width
    }

    fn client_height(&self) -> u32 {
        self.height
    }
}

extern "system" fn wndproc(window: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match message {
        WM_KEYDOWN if wparam.0 == VK_ESCAPE.0 as usize => {
            if let Err(e) = unsafe { DestroyWindow(window) } {
                tracing::warn!("DestroyWindow failed: {}", e);
            }
            LRESULT(0)
        }
        WM_DESTROY => {
            QUIT_REQUESTED.store(true, Ordering::Relaxed);
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(window, message, wparam, lparam) },
    }
}
