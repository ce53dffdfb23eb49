pub mod svg2ico;
