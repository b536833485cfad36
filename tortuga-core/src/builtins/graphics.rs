//! Turtle primitives. Everything here delegates to the injected `Turtle`
//! backend, which owns rendering and may suspend for animation.

use super::*;
use crate::eval::RunResult;
use crate::host::{PenMode, TurtleMode};

pub(crate) fn install(it: &mut Interpreter) {
    it.prim(&["forward", "fd"], 1, builtin_forward);
    it.prim(&["back", "bk"], 1, builtin_back);
    it.prim(&["left", "lt"], 1, builtin_left);
    it.prim(&["right", "rt"], 1, builtin_right);
    it.prim(&["setpos"], 1, builtin_setpos);
    it.prim(&["setxy"], 2, builtin_setxy);
    it.prim(&["setx"], 1, builtin_setx);
    it.prim(&["sety"], 1, builtin_sety);
    it.prim(&["setheading", "seth"], 1, builtin_setheading);
    it.prim(&["home"], 0, builtin_home);
    it.prim(&["arc"], 2, builtin_arc);
    it.prim(&["pos"], 0, builtin_pos);
    it.prim(&["xcor"], 0, builtin_xcor);
    it.prim(&["ycor"], 0, builtin_ycor);
    it.prim(&["heading"], 0, builtin_heading);
    it.prim(&["towards"], 1, builtin_towards);
    it.prim(&["showturtle", "st"], 0, builtin_showturtle);
    it.prim(&["hideturtle", "ht"], 0, builtin_hideturtle);
    it.prim(&["shownp", "shown?"], 0, builtin_shownp);
    it.prim(&["clean"], 0, builtin_clean);
    it.prim(&["clearscreen", "cs"], 0, builtin_clearscreen);
    it.prim(&["wrap"], 0, builtin_wrap);
    it.prim(&["window"], 0, builtin_window);
    it.prim(&["fence"], 0, builtin_fence);
    it.prim(&["turtlemode"], 0, builtin_turtlemode);
    it.prim(&["fill"], 0, builtin_fill);
    it.prim(&["filled"], 2, builtin_filled);
    it.prim(&["label"], 1, builtin_label);
    it.prim(&["setlabelheight"], 1, builtin_setlabelheight);
    it.prim(&["labelsize"], 0, builtin_labelsize);
    it.prim(&["setfontname"], 1, builtin_setfontname);
    it.prim(&["fontname"], 0, builtin_fontname);
    it.prim(&["pendown", "pd"], 0, builtin_pendown);
    it.prim(&["penup", "pu"], 0, builtin_penup);
    it.prim(&["penpaint", "ppt"], 0, builtin_penpaint);
    it.prim(&["penerase", "pe"], 0, builtin_penerase);
    it.prim(&["penreverse", "px"], 0, builtin_penreverse);
    it.prim(&["pendownp", "pendown?"], 0, builtin_pendownp);
    it.prim(&["penmode"], 0, builtin_penmode);
    it.prim(&["setpencolor", "setpc", "setcolor"], 1, builtin_setpencolor);
    it.prim(&["pencolor", "pc"], 0, builtin_pencolor);
    it.prim(&["setpensize", "setwidth"], 1, builtin_setpensize);
    it.prim(&["pensize"], 0, builtin_pensize);
    it.prim(
        &["setbackground", "setbg", "setscreencolor"],
        1,
        builtin_setbackground,
    );
    it.prim(
        &["background", "bg", "getscreencolor"],
        0,
        builtin_background,
    );
    it.prim(&["setscrunch"], 2, builtin_setscrunch);
    it.prim(&["scrunch"], 0, builtin_scrunch);
}

/// A color input is a named-color word or an `[r g b]` list.
fn color_text(it: &Interpreter, value: &Value) -> Result<String, Flow> {
    match value {
        Value::Word(w) => Ok(w.as_text()),
        Value::List(_) => {
            let parts = expect_list_of_len(it, value, 3)?;
            let mut channels = [0u8; 3];
            for (slot, part) in channels.iter_mut().zip(parts.iter()) {
                let n = expect_number(it, part)?;
                *slot = n.clamp(0.0, 255.0) as u8;
            }
            Ok(format!(
                "#{:02x}{:02x}{:02x}",
                channels[0], channels[1], channels[2]
            ))
        }
        Value::Array(_) => Err(it.err("{_PROC_}: Expected list", &[])),
    }
}

pub(crate) fn builtin_forward(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let distance = expect_number(it, arg(it, &args, 0)?)?;
    it.turtle.move_by(distance);
    Ok(None)
}

pub(crate) fn builtin_back(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let distance = expect_number(it, arg(it, &args, 0)?)?;
    it.turtle.move_by(-distance);
    Ok(None)
}

pub(crate) fn builtin_left(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let degrees = expect_number(it, arg(it, &args, 0)?)?;
    it.turtle.turn(-degrees);
    Ok(None)
}

pub(crate) fn builtin_right(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let degrees = expect_number(it, arg(it, &args, 0)?)?;
    it.turtle.turn(degrees);
    Ok(None)
}

pub(crate) fn builtin_setpos(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let pair = expect_list_of_len(it, arg(it, &args, 0)?, 2)?;
    let x = expect_number(it, &pair[0])?;
    let y = expect_number(it, &pair[1])?;
    it.turtle.set_position(Some(x), Some(y));
    Ok(None)
}

pub(crate) fn builtin_setxy(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let x = expect_number(it, arg(it, &args, 0)?)?;
    let y = expect_number(it, arg(it, &args, 1)?)?;
    it.turtle.set_position(Some(x), Some(y));
    Ok(None)
}

pub(crate) fn builtin_setx(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let x = expect_number(it, arg(it, &args, 0)?)?;
    it.turtle.set_position(Some(x), None);
    Ok(None)
}

pub(crate) fn builtin_sety(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let y = expect_number(it, arg(it, &args, 0)?)?;
    it.turtle.set_position(None, Some(y));
    Ok(None)
}

pub(crate) fn builtin_setheading(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let degrees = expect_number(it, arg(it, &args, 0)?)?;
    it.turtle.set_heading(degrees);
    Ok(None)
}

pub(crate) fn builtin_home(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.home();
    Ok(None)
}

pub(crate) fn builtin_arc(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let angle = expect_number(it, arg(it, &args, 0)?)?;
    let radius = expect_number(it, arg(it, &args, 1)?)?;
    it.turtle.arc(angle, radius);
    Ok(None)
}

pub(crate) fn builtin_pos(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    let (x, y) = it.turtle.position();
    Ok(Some(Value::list(vec![Value::num(x), Value::num(y)])))
}

pub(crate) fn builtin_xcor(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::num(it.turtle.position().0)))
}

pub(crate) fn builtin_ycor(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::num(it.turtle.position().1)))
}

pub(crate) fn builtin_heading(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::num(it.turtle.heading())))
}

pub(crate) fn builtin_towards(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let pair = expect_list_of_len(it, arg(it, &args, 0)?, 2)?;
    let x = expect_number(it, &pair[0])?;
    let y = expect_number(it, &pair[1])?;
    Ok(Some(Value::num(it.turtle.towards(x, y))))
}

pub(crate) fn builtin_showturtle(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.show();
    Ok(None)
}

pub(crate) fn builtin_hideturtle(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.hide();
    Ok(None)
}

pub(crate) fn builtin_shownp(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::bool(it.turtle.visible())))
}

pub(crate) fn builtin_clean(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.clear();
    Ok(None)
}

pub(crate) fn builtin_clearscreen(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.clear_screen();
    Ok(None)
}

pub(crate) fn builtin_wrap(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.set_mode(TurtleMode::Wrap);
    Ok(None)
}

pub(crate) fn builtin_window(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.set_mode(TurtleMode::Window);
    Ok(None)
}

pub(crate) fn builtin_fence(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.set_mode(TurtleMode::Fence);
    Ok(None)
}

pub(crate) fn builtin_turtlemode(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::word(it.turtle.mode().as_ref())))
}

pub(crate) fn builtin_fill(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.fill();
    Ok(None)
}

/// `FILLED color statements`: trace a path while running the statements,
/// then fill it.
pub(crate) fn builtin_filled(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let color = color_text(it, arg(it, &args, 0)?)?;
    let block = arg(it, &args, 1)?.clone();
    it.turtle.begin_path();
    let tokens = it.reparse(&block)?;
    let result = it.execute_tokens(tokens, false);
    it.turtle.fill_path(&color);
    result.map(|_| None)
}

pub(crate) fn builtin_label(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let text = crate::print::stringify_nodecorate(arg(it, &args, 0)?);
    it.turtle.draw_text(&text);
    Ok(None)
}

pub(crate) fn builtin_setlabelheight(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let size = expect_number(it, arg(it, &args, 0)?)?;
    it.turtle.set_font_size(size);
    Ok(None)
}

pub(crate) fn builtin_labelsize(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    let size = it.turtle.font_size();
    Ok(Some(Value::list(vec![Value::num(size), Value::num(size)])))
}

pub(crate) fn builtin_setfontname(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let name = expect_word(it, arg(it, &args, 0)?)?;
    it.turtle.set_font_name(&name);
    Ok(None)
}

pub(crate) fn builtin_fontname(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::word(it.turtle.font_name())))
}

pub(crate) fn builtin_pendown(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.pen_down();
    Ok(None)
}

pub(crate) fn builtin_penup(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.pen_up();
    Ok(None)
}

pub(crate) fn builtin_penpaint(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.set_pen_mode(PenMode::Paint);
    it.turtle.pen_down();
    Ok(None)
}

pub(crate) fn builtin_penerase(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.set_pen_mode(PenMode::Erase);
    it.turtle.pen_down();
    Ok(None)
}

pub(crate) fn builtin_penreverse(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    it.turtle.set_pen_mode(PenMode::Reverse);
    it.turtle.pen_down();
    Ok(None)
}

pub(crate) fn builtin_pendownp(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::bool(it.turtle.is_pen_down())))
}

pub(crate) fn builtin_penmode(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::word(it.turtle.pen_mode().as_ref())))
}

pub(crate) fn builtin_setpencolor(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let color = color_text(it, arg(it, &args, 0)?)?;
    it.turtle.set_pen_color(&color);
    Ok(None)
}

pub(crate) fn builtin_pencolor(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::word(it.turtle.pen_color())))
}

pub(crate) fn builtin_setpensize(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    // Accepts a bare width or a [width height] pair; only width is used.
    let width = match arg(it, &args, 0)? {
        Value::List(_) => {
            let pair = expect_list_of_len(it, arg(it, &args, 0)?, 2)?;
            expect_number(it, &pair[0])?
        }
        other => expect_number(it, other)?,
    };
    it.turtle.set_pen_width(width);
    Ok(None)
}

pub(crate) fn builtin_pensize(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    let width = it.turtle.pen_width();
    Ok(Some(Value::list(vec![
        Value::num(width),
        Value::num(width),
    ])))
}

pub(crate) fn builtin_setbackground(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let color = color_text(it, arg(it, &args, 0)?)?;
    it.turtle.set_bg_color(&color);
    Ok(None)
}

pub(crate) fn builtin_background(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    Ok(Some(Value::word(it.turtle.bg_color())))
}

pub(crate) fn builtin_setscrunch(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let sx = expect_number(it, arg(it, &args, 0)?)?;
    let sy = expect_number(it, arg(it, &args, 1)?)?;
    if sx == 0.0 || sy == 0.0 {
        return Err(it.err("{_PROC_}: Expected number greater than zero", &[]));
    }
    it.turtle.set_scrunch(sx, sy);
    Ok(None)
}

pub(crate) fn builtin_scrunch(it: &mut Interpreter, _args: Vec<Value>) -> RunResult {
    let (sx, sy) = it.turtle.scrunch();
    Ok(Some(Value::list(vec![Value::num(sx), Value::num(sy)])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_text_accepts_words_and_triples() {
        use crate::host::{BufferStream, RecordingTurtle};
        let it = Interpreter::new(
            Box::new(RecordingTurtle::new()),
            Box::new(BufferStream::new()),
        );
        assert_eq!(color_text(&it, &Value::word("red")).unwrap(), "red");
        let triple = Value::list(vec![Value::num(255.0), Value::num(0.0), Value::num(16.0)]);
        assert_eq!(color_text(&it, &triple).unwrap(), "#ff0010");
    }
}
