use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Float32Array, Function};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, EventTarget, HtmlElement};

use crate::{ButtonSimulation, CanvasSimulation};

/// Something the frame loop can drive. Each frame runs to completion before
/// the next is requested.
trait FrameHost {
    /// Advance one frame. A returned callback runs after the host borrow is
    /// released, so page code it triggers may reach back into the host.
    fn frame(&mut self) -> Result<Option<PageCallback>, JsValue>;

    /// Element whose removal from the document ends the loop
    fn surface(&self) -> &Element;

    fn listeners(&mut self) -> &mut Listeners;
}

/// A page function and the argument to call it with
struct PageCallback {
    function: Function,
    argument: JsValue,
}

impl PageCallback {
    fn call(&self) -> Result<(), JsValue> {
        self.function.call1(&JsValue::NULL, &self.argument)?;
        Ok(())
    }
}

/// Event listeners owned by one running loop, detached when it stops
#[derive(Default)]
struct Listeners {
    attached: Vec<(EventTarget, &'static str, Closure<dyn FnMut(web_sys::Event)>)>,
}

impl Listeners {
    fn add(
        &mut self,
        target: &EventTarget,
        event: &'static str,
        mut handler: impl FnMut() + 'static,
    ) -> Result<(), JsValue> {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| handler());
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        self.attached.push((target.clone(), event, closure));
        Ok(())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.attached.len()
    }

    fn remove_all(self) {
        for (target, event, closure) in self.attached {
            if let Err(err) =
                target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            {
                log::warn!("Failed to remove {} listener: {:?}", event, err);
            }
        }
    }
}

struct CanvasHost {
    simulation: CanvasSimulation,
    listeners: Listeners,
}

impl FrameHost for CanvasHost {
    fn frame(&mut self) -> Result<Option<PageCallback>, JsValue> {
        self.simulation.tick();
        self.simulation.render()?;
        Ok(None)
    }

    fn surface(&self) -> &Element {
        self.simulation.element()
    }

    fn listeners(&mut self) -> &mut Listeners {
        &mut self.listeners
    }
}

struct ButtonHost {
    simulation: ButtonSimulation,
    button: HtmlElement,
    on_frame: Function,
    listeners: Listeners,
}

impl FrameHost for ButtonHost {
    fn frame(&mut self) -> Result<Option<PageCallback>, JsValue> {
        self.simulation.tick();
        let matrices = Float32Array::from(self.simulation.instance_matrices().as_slice());
        Ok(Some(PageCallback {
            function: self.on_frame.clone(),
            argument: matrices.into(),
        }))
    }

    fn surface(&self) -> &Element {
        self.button.as_ref()
    }

    fn listeners(&mut self) -> &mut Listeners {
        &mut self.listeners
    }
}

/// Run the 2D flock on `canvas_id` until the canvas leaves the document
#[wasm_bindgen]
pub fn start_canvas(canvas_id: &str, settings_json: Option<String>) -> Result<(), JsValue> {
    let simulation = CanvasSimulation::new(canvas_id, settings_json)?;
    let host = Rc::new(RefCell::new(CanvasHost {
        simulation,
        listeners: Listeners::default(),
    }));

    let window = web_sys::window().ok_or("no global window")?;
    let mut listeners = Listeners::default();
    {
        let host = host.clone();
        listeners.add(&window, "resize", move || {
            if let Err(err) = host.borrow_mut().simulation.fit_to_layout() {
                log::warn!("Canvas resize ignored: {:?}", err);
            }
        })?;
    }
    host.borrow_mut().listeners = listeners;

    request_animation_frame(host);
    log::info!("Canvas flock running on #{}", canvas_id);
    Ok(())
}

/// Run the 3D flock sized to `button_id`, calling `on_frame(matrices)` each frame.
///
/// Hovering the button speeds the flock up; the loop ends when the button
/// leaves the document.
#[wasm_bindgen]
pub fn start_button(
    button_id: &str,
    on_frame: Function,
    settings_json: Option<String>,
) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no global window")?;
    let document = window.document().ok_or("no document")?;
    let button = document
        .get_element_by_id(button_id)
        .ok_or("button not found")?
        .dyn_into::<HtmlElement>()?;

    let host = attach_button(button, on_frame, settings_json)?;
    request_animation_frame(host);
    log::info!("Button flock running on #{}", button_id);
    Ok(())
}

/// Build the button host and wire its hover and resize listeners
fn attach_button(
    button: HtmlElement,
    on_frame: Function,
    settings_json: Option<String>,
) -> Result<Rc<RefCell<ButtonHost>>, JsValue> {
    let window = web_sys::window().ok_or("no global window")?;
    let simulation = ButtonSimulation::new(
        button.offset_width() as f32,
        button.offset_height() as f32,
        settings_json,
    )?;
    let host = Rc::new(RefCell::new(ButtonHost {
        simulation,
        button: button.clone(),
        on_frame,
        listeners: Listeners::default(),
    }));

    let mut listeners = Listeners::default();
    for (event, hovered) in [("mouseenter", true), ("mouseleave", false)] {
        let host = host.clone();
        listeners.add(&button, event, move || {
            host.borrow_mut().simulation.set_hovered(hovered);
        })?;
    }
    {
        let host = host.clone();
        listeners.add(&window, "resize", move || {
            let mut host = host.borrow_mut();
            let width = host.button.offset_width() as f32;
            let height = host.button.offset_height() as f32;
            if let Err(err) = host.simulation.resize(width, height) {
                log::warn!("Button resize ignored: {:?}", err);
            }
        })?;
    }
    host.borrow_mut().listeners = listeners;

    Ok(host)
}

fn request_animation_frame<H: FrameHost + 'static>(host: Rc<RefCell<H>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = Closure::once_into_js(move |_time: f64| {
        run_frame(host);
    });
    if let Err(err) = window.request_animation_frame(callback.unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {:?}", err);
    }
}

/// One animation frame; returns whether the loop continues
fn run_frame<H: FrameHost + 'static>(host: Rc<RefCell<H>>) -> bool {
    let outcome = {
        let mut current = host.borrow_mut();
        if !current.surface().is_connected() {
            None
        } else {
            Some(current.frame())
        }
    };

    let result = match outcome {
        None => {
            log::info!("Flock surface detached, stopping");
            stop(&host);
            return false;
        }
        Some(Ok(callback)) => callback.map_or(Ok(()), |callback| callback.call()),
        Some(Err(err)) => Err(err),
    };

    if let Err(err) = result {
        log::error!("Frame failed, stopping: {:?}", err);
        stop(&host);
        return false;
    }

    request_animation_frame(host);
    true
}

/// Detach the loop's listeners so nothing keeps the host alive
fn stop<H: FrameHost>(host: &Rc<RefCell<H>>) {
    let listeners = std::mem::take(host.borrow_mut().listeners());
    listeners.remove_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn mount_button(id: &str) -> HtmlElement {
        let document = web_sys::window().unwrap().document().unwrap();
        let button = document
            .create_element("button")
            .unwrap()
            .dyn_into::<HtmlElement>()
            .unwrap();
        button.set_id(id);
        button.set_inner_text("Portfolio");
        document.body().unwrap().append_child(&button).unwrap();
        button
    }

    #[wasm_bindgen_test]
    fn listeners_stop_firing_once_removed() {
        let button = mount_button("flock-listeners");
        let count = Rc::new(Cell::new(0));
        let mut listeners = Listeners::default();
        {
            let count = count.clone();
            listeners
                .add(&button, "mouseenter", move || count.set(count.get() + 1))
                .unwrap();
        }

        let event = web_sys::Event::new("mouseenter").unwrap();
        button.dispatch_event(&event).unwrap();
        assert_eq!(count.get(), 1);

        listeners.remove_all();
        button.dispatch_event(&event).unwrap();
        assert_eq!(count.get(), 1);
        button.remove();
    }

    #[wasm_bindgen_test]
    fn frame_callback_may_dispatch_events() {
        let button = mount_button("flock-reentrant");
        let on_frame = Function::new_with_args(
            "matrices",
            "window.dispatchEvent(new Event('resize'));\
             document.getElementById('flock-reentrant').dispatchEvent(new Event('mouseenter'));",
        );
        let host = attach_button(button.clone(), on_frame, None).unwrap();
        assert_eq!(host.borrow_mut().listeners().len(), 3);

        assert!(run_frame(host.clone()));
        assert_eq!(host.borrow().simulation.frame(), 1);
        assert!(host.borrow().simulation.is_hovered());

        button.remove();
        assert!(!run_frame(host.clone()));
        assert_eq!(host.borrow_mut().listeners().len(), 0);
        assert_eq!(host.borrow().simulation.frame(), 1);
    }
}
